fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF sysenv is only needed when building the firmware binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
