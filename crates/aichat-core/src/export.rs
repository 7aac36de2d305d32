//! Markdown helpers for the response text: HTML export and code-block copy

use std::fs;
use std::path::Path;

use pulldown_cmark::{html, Options, Parser};

use crate::error::{ChatError, ChatResult};

/// Convert markdown (tables and fenced code included) to a standalone HTML page.
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>aichat export</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 0 auto; padding: 2rem; line-height: 1.6; }}
        pre {{ background: #f4f4f4; padding: 1rem; overflow-x: auto; border-radius: 4px; }}
        code {{ background: #f4f4f4; padding: 0.2rem 0.4rem; border-radius: 3px; }}
        pre code {{ background: none; padding: 0; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border: 1px solid #ddd; padding: 0.5rem; text-align: left; }}
        th {{ background: #f4f4f4; }}
    </style>
</head>
<body>
{}</body>
</html>
"#,
        body
    )
}

/// Write the rendered page to `path` and hand it to the default viewer.
pub fn export_html(markdown: &str, path: &Path) -> ChatResult<()> {
    fs::write(path, render_html(markdown))
        .map_err(|e| ChatError::Export(format!("Failed to write {:?}: {}", path, e)))?;

    let target = path.to_string_lossy();
    webbrowser::open(&target)
        .map_err(|e| ChatError::Export(format!("Failed to open {}: {}", target, e)))?;

    tracing::info!(path = %path.display(), "exported response");
    Ok(())
}

/// Lines inside the first ``` fenced block, joined with newlines.
///
/// The fence lines themselves are dropped. An unterminated block runs to the
/// end of the text. Returns `None` if nothing was collected.
pub fn first_code_block(text: &str) -> Option<String> {
    let mut in_block = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with("```") {
            if in_block {
                break;
            }
            in_block = true;
        } else if in_block {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
