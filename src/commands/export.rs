//! `boxes-live export`: write a saved board as plain text without opening
//! the terminal UI.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::export;
use crate::parser::canvas_file;
use crate::parser::config::Config;

pub fn run(config: &Config, file: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = file.unwrap_or_else(|| PathBuf::from(&config.save_path));
    let output = output.unwrap_or_else(|| PathBuf::from(&config.export_path));
    export_file(&input, &output)?;
    println!("Exported {} to {}", input.display(), output.display());
    Ok(())
}

fn export_file(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        bail!("no canvas file at {}", input.display());
    }
    let canvas = canvas_file::load(input)?;
    export::export_to_file(&canvas, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::store::Canvas;
    use tempfile::TempDir;

    #[test]
    fn exports_saved_board() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("board.txt");
        let output = dir.path().join("board.ascii");
        let mut canvas = Canvas::new(4.0, 3.0);
        canvas.add_box(0.0, 0.0, 4, 3, None).unwrap();
        canvas_file::save(&canvas, &input).unwrap();

        export_file(&input, &output).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "+--+\n|  |\n+--+\n");
    }

    #[test]
    fn missing_board_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = export_file(&dir.path().join("none.txt"), &dir.path().join("out.txt"))
            .unwrap_err();
        assert!(err.to_string().contains("no canvas file"));
    }
}
