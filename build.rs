//! Build script for pinned-host-mem.
//!
//! The CUDA runtime is reached through `cudarc`, which locates and loads
//! `libcudart` itself, so nothing is compiled or linked here.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "cuda")]
    {
        println!("cargo:warning=CUDA feature enabled — ensure the CUDA runtime (libcudart) is installed");
    }
}
