use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, UserSettings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(resolved.join("data"))?;

    let user_settings = resolved.join("user_settings.json");
    if !user_settings.exists() {
        let json = serde_json::to_string_pretty(&UserSettings::template())?;
        std::fs::write(&user_settings, format!("{json}\n"))?;
        println!("Wrote {}", user_settings.display());
    }

    println!("Initialized cardwise at {}", resolved.display());
    println!(
        "Put your bank export at {} or pass --input.",
        resolved.join("data").join("operations.xlsx").display()
    );
    Ok(())
}
