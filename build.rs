use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// Keys read from ota_config.h and exported to the firmware as env vars
const CONFIG_KEYS: [&str; 13] = [
    "WIFI_SSID",
    "WIFI_PASSWORD",
    "OTA_VERSION",
    "OTA_SERVER",
    "OTA_PORT",
    "OTA_OWNER_NAME",
    "OTA_REPO_NAME",
    "OTAGH_OWNER_NAME",
    "OTAGH_REPO_NAME",
    "OTA_CHECK_PATH",
    "OTA_BIN_PATH",
    "OTA_BEARER",
    "OTA_LOG_LEVEL",
];

// (source, staged name) pairs for the optional trust anchors
const CERTS: [(&str, &str); 2] = [
    ("certs/ca.pem", "ca.pem"),
    ("certs/redirect_ca.pem", "redirect_ca.pem"),
];

fn main() -> anyhow::Result<()> {
    // Necessary for ESP-IDF
    embuild::espidf::sysenv::output();

    // Add crash log helper for better panic diagnostics
    println!("cargo:rustc-link-arg=-Wl,--undefined=esp_backtrace_print_app_description");

    // Read OTA + WiFi configuration if it exists
    let config_path = "ota_config.h";
    println!("cargo:rerun-if-changed={}", config_path);
    if Path::new(config_path).exists() {
        let contents = fs::read_to_string(config_path)?;
        for key in CONFIG_KEYS {
            // An empty value means "not configured"; the firmware uses option_env!
            if let Some(value) = define_value(&contents, key).filter(|v| !v.is_empty()) {
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    } else {
        println!("cargo:warning=ota_config.h not found! Copy ota_config.h.example to ota_config.h and fill in your repository.");
    }

    // Build instant, reproducible when SOURCE_DATE_EPOCH is set
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    let build_epoch = match env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => epoch,
        Err(_) => SystemTime::now()
            .duration_since(UNIX_EPOCH)?
            .as_secs()
            .to_string(),
    };
    println!("cargo:rustc-env=OTA_BUILD_TIMESTAMP={}", build_epoch);

    // Stage the trust anchors nul-terminated; an empty file means "use the bundle"
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    for (source, staged) in CERTS {
        println!("cargo:rerun-if-changed={}", source);
        let mut pem = if Path::new(source).exists() {
            fs::read(source)?
        } else {
            Vec::new()
        };
        if !pem.is_empty() {
            pem.push(0);
        }
        fs::write(out_dir.join(staged), pem)?;
    }

    Ok(())
}

/// Value of a `#define KEY "value"` (or `#define KEY value`) line.
fn define_value(contents: &str, key: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let mut parts = line.trim().splitn(3, char::is_whitespace);
        if parts.next()? != "#define" || parts.next()? != key {
            return None;
        }
        let raw = parts.next()?.trim();
        match raw.split('"').nth(1) {
            Some(quoted) => Some(quoted.to_string()),
            None => Some(raw.to_string()),
        }
    })
}
