fn main() {
    // ESP-IDF link arguments are only needed for firmware images; host
    // builds (tests, fuzzing) compile without the toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
