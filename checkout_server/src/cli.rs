use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "CKO_HOST",
        "CKO_PORT",
        "CKO_DATABASE_URL",
        "CKO_USE_X_FORWARDED_FOR",
        "CKO_USE_FORWARDED",
        "CKO_USER_ID_HEADER",
        "CKO_RESERVATION_WINDOW_MINS",
        "CKO_CURRENCY",
        "CKO_CURRENCY_SCALE",
        "CKO_RESTOCK_INTERVAL_SECS",
        "CKO_RESTOCK_BATCH_SIZE",
        "CKO_PAYMENT_EXPIRY_INTERVAL_SECS",
        "CKO_VNP_TMN_CODE",
        "CKO_VNP_PAY_URL",
        "CKO_VNP_RETURN_URL",
        "CKO_VNP_VERSION",
        "CKO_VNP_LOCALE",
        "CKO_VNP_ORDER_TYPE",
        "CKO_VNP_UTC_OFFSET_HOURS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
