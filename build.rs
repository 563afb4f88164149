fn main() {
    // Credentials may be baked into the image through option_env!().
    for var in [
        "THERMOBOT_WIFI_SSID",
        "THERMOBOT_WIFI_PASSWORD",
        "THERMOBOT_BOT_TOKEN",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
