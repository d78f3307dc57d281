use crate::core::message::{Part, Turn};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Plain-text copy of the visible conversation, appended turn by turn.
pub struct TranscriptLog {
    file_path: PathBuf,
}

impl TranscriptLog {
    /// Opens (creating if needed) `path` to make sure it is writable.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let file_path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;
        file.flush()?;
        Ok(Self { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn log_turn(&self, turn: &Turn) -> std::io::Result<()> {
        self.write_to_log(&render_turn(turn))
    }

    fn write_to_log(&self, content: &str) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }

        // Blank line between turns, matching the screen layout
        writeln!(writer)?;
        writer.flush()
    }
}

fn render_part(part: &Part) -> String {
    match part {
        Part::Text(text) => text.clone(),
        Part::Image(image) => format!(
            "[image: {} {}x{}]",
            image.format.as_str(),
            image.width(),
            image.height()
        ),
    }
}

fn render_turn(turn: &Turn) -> String {
    let body = turn
        .parts
        .iter()
        .map(render_part)
        .collect::<Vec<_>>()
        .join("\n");
    if turn.is_user() {
        format!("You: {body}")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::decode_image;
    use crate::core::image::fixtures::png_bytes;
    use crate::core::message::Role;
    use tempfile::TempDir;

    #[test]
    fn turns_are_appended_with_spacing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = TranscriptLog::new(temp_dir.path().join("chat.log")).expect("log opens");

        log.log_turn(&Turn::user_text("Why does this loop fail?"))
            .expect("write user");
        log.log_turn(&Turn::assistant_text("It fails because...\nthe bound is off."))
            .expect("write assistant");

        let written = std::fs::read_to_string(log.path()).expect("read log");
        assert_eq!(
            written,
            "You: Why does this loop fail?\n\nIt fails because...\nthe bound is off.\n\n"
        );
    }

    #[test]
    fn images_are_logged_as_placeholders() {
        let image = decode_image(0, &png_bytes()).expect("png decodes");
        let turn = Turn::new(Role::User, vec![Part::text("look"), Part::Image(image)]);
        assert_eq!(render_turn(&turn), "You: look\n[image: png 4x3]");
    }

    #[test]
    fn unwritable_path_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing_dir = temp_dir.path().join("missing").join("chat.log");
        assert!(TranscriptLog::new(missing_dir).is_err());
    }
}
