fn main() {
    // ndarray-linalg has no backend feature enabled on macOS; Accelerate
    // provides LAPACK there (DGEEV for poles, DGGEV for zeros)
    #[cfg(target_os = "macos")]
    {
        println!("cargo:rustc-link-lib=framework=Accelerate");
    }
}
