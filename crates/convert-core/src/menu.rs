//! User-facing texts

use convert_types::{ExtensionCatalog, FamilyMenu, PayloadKind};

pub const CANCELLED: &str = "Operation cancelled.";
pub const SAME_EXTENSION: &str = "Nice try, Don't choose same Extension";
pub const UNSUPPORTED: &str = "Not in any Supported Format";
pub const NO_ACTIVE_OPERATION: &str =
    "No active operation. Send a file first, then choose a format.";
pub const MAKE_HINT: &str = "For Text messages, You can use /make to Create a File from it.\n\
     (first line of text will be truncated and used as filename)";
pub const MAKE_NEEDS_TEXT: &str = "Send some multi-line text first, then use /make.";
pub const RENAME_USAGE: &str = "Usage: /rename new_name.ext (reply after sending a file)";
pub const FEATURE_DISABLED: &str = "This feature is not enabled on this bot.";

/// Keyboard input placeholder
pub const PLACEHOLDER: &str = "convert to";

/// Buttons per keyboard row
pub const MENU_WIDTH: usize = 3;

pub fn welcome_text(name: Option<&str>) -> String {
    let greeting = match name {
        Some(name) => format!("👋 Welcome {}!", name),
        None => "👋 Welcome!".to_string(),
    };
    format!(
        "{}\n\nI'm a File Converter Bot. Send me any file and I'll help you convert it.\n\n\
         Use /help for more information.",
        greeting
    )
}

/// Command list followed by every family and its members
pub fn help_text(catalog: &ExtensionCatalog) -> String {
    let mut text = String::from(
        "📚 Help Menu\n\n\
         Commands:\n\
         • /start - Start the bot\n\
         • /help - Show this help\n\
         • /cancel - Cancel current operation\n\
         • /rename - Rename file\n\
         • /make - Create file from text\n\n\
         How to use:\n\
         1. Send me any file (document, photo, video, audio, sticker)\n\
         2. Choose the output format\n\
         3. Wait for conversion\n\
         4. Download your converted file\n\n\
         Supported Formats:\n",
    );
    for family in catalog.families() {
        text.push_str(&format!("• {}: {}\n", family.label(), catalog.describe(family)));
    }
    text
}

/// Prompt sent when a session opens.
///
/// `source_ext` is shown for documents and stickers; the other kinds are
/// announced by kind name.
pub fn session_prompt(
    kind: PayloadKind,
    source_ext: Option<&str>,
    menu: Option<&FamilyMenu>,
    sender: Option<&str>,
) -> String {
    let detected = match (kind, source_ext) {
        (PayloadKind::Document | PayloadKind::Sticker, Some(ext)) => {
            format!("Detected Extension: {}", ext.to_uppercase())
        }
        (PayloadKind::Document, None) => "Detected Extension: Unknown".to_string(),
        (kind, _) => format!("Detected: {}", kind),
    };

    let mut text = format!("{}\nNow send the extension to convert to...\n\n", detected);

    match menu {
        Some(menu) => {
            if !menu.targets.is_empty() {
                text.push_str(&format!(
                    "--Available formats--\n\n{}\n\n",
                    menu.targets.join(", ")
                ));
            }
            if !menu.special_ops.is_empty() {
                let ops: Vec<&str> = menu.special_ops.iter().map(|op| op.token()).collect();
                text.push_str(&format!("SPECIAL 🎁\n{}\n\n", ops.join(", ")));
            }
        }
        None => text.push_str("Available formats depend on file type.\n\n"),
    }

    match sender {
        Some(name) => text.push_str(&format!("{} choose or click /cancel to Cancel", name)),
        None => text.push_str("Choose or click /cancel to Cancel"),
    }
    text
}
