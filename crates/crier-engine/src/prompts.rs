use crier_core::content::{BroadcastContent, Button};

/// Fixed per-state prompt text shown to the operator.
pub const CONTENT_PROMPT: &str = "Choose the broadcast type and send it:\n\
1. Text — send a plain message\n\
2. Photo — send a photo with a caption\n\
3. Video — send a video with a caption";

pub const BUTTON_LABEL_PROMPT: &str =
    "Enter the button label.\nIf no button is needed, send: -";

pub const BUTTON_LINK_PROMPT: &str = "Enter the link for the button.\n\
A regular link (https://…) or an in-app view path both work.";

pub const INVALID_CONTENT: &str = "Unsupported format. Send text, a photo, or a video.";

pub const CANCELLED: &str = "Broadcast cancelled.";

pub const CONFIRM_CONTROLS: &str = "Send this broadcast? [confirm / cancel]";

/// Render the preview shown before confirmation. Mirrors the draft:
/// content, caption, and the button if one was attached.
pub fn render_preview(content: &BroadcastContent, button: Option<&Button>) -> String {
    let mut out = String::from("Preview:\n\n");

    match content {
        BroadcastContent::Text { body } => out.push_str(body),
        BroadcastContent::Photo { file_ref, caption } => {
            out.push_str(&format!("[photo {file_ref}]"));
            if let Some(caption) = caption {
                out.push('\n');
                out.push_str(caption);
            }
        }
        BroadcastContent::Video { file_ref, caption } => {
            out.push_str(&format!("[video {file_ref}]"));
            if let Some(caption) = caption {
                out.push('\n');
                out.push_str(caption);
            }
        }
    }

    if let Some(button) = button {
        out.push_str(&format!(
            "\n[{} -> {} ({})]",
            button.label,
            button.target.url(),
            button.target.kind()
        ));
    }

    out.push_str("\n\n");
    out.push_str(CONFIRM_CONTROLS);
    out
}
