use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::chart::CHART_DIR;

pub const COLLAGE_FILE: &str = "stock_charts_collage.html";

/// Regenerates the HTML collage from whatever chart images currently
/// exist. Runs after the render batch regardless of how many symbols
/// failed; with nothing to show, no document is written.
pub fn run() -> Result<()> {
    match assemble(Path::new(CHART_DIR), Path::new(COLLAGE_FILE))? {
        Some(count) => {
            println!("HTML collage generated: {} ({} charts)", COLLAGE_FILE, count);
            println!("Open {} in your browser to view the collage", COLLAGE_FILE);
        }
        None => println!("No PNG files found in {}/ directory", CHART_DIR),
    }
    Ok(())
}

/// Returns how many charts went into the document, or `None` when there
/// was nothing to assemble and no document was written.
fn assemble(chart_dir: &Path, output_file: &Path) -> Result<Option<usize>> {
    let png_files = find_png_files(chart_dir)?;
    if png_files.is_empty() {
        return Ok(None);
    }
    println!("Found {} PNG files to include in collage", png_files.len());

    let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(output_file, build_html(&png_files, &generated_at))?;
    Ok(Some(png_files.len()))
}

/// Filenames of every chart image directly inside `dir`, sorted for a
/// reproducible collage order. Only plain files are taken, so an archive
/// subdirectory never leaks in.
fn find_png_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("png") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn build_html(png_files: &[String], generated_at: &str) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0, user-scalable=yes, maximum-scale=5.0, minimum-scale=0.5">
    <title>Stock Charts Collage</title>
    <style>
        body {{
            margin: 0;
            padding: 20px;
            font-family: Arial, sans-serif;
            background-color: #f5f5f5;
        }}
        .header {{
            text-align: center;
            margin-bottom: 30px;
        }}
        .charts-grid {{
            display: grid;
            grid-template-columns: repeat(10, 1fr);
            gap: 10px;
            margin: 0 auto;
        }}
        .chart-container {{
            background: white;
            border-radius: 4px;
            padding: 8px;
            box-shadow: 0 1px 4px rgba(0,0,0,0.1);
            text-align: center;
        }}
        .chart-title {{
            font-size: 10px;
            font-weight: bold;
            margin-bottom: 5px;
            color: #333;
        }}
        .chart-image {{
            max-width: 100%;
            height: auto;
            border-radius: 4px;
        }}
        .stats {{
            text-align: center;
            margin-bottom: 20px;
            color: #666;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Stock Charts Collage</h1>
        <div class="stats">
            Generated on: {generated_at} UTC<br>
            Total Charts: {count}
        </div>
    </div>

    <div class="charts-grid">
"#,
        generated_at = generated_at,
        count = png_files.len()
    );

    for png_file in png_files {
        // The label is the filename stem, which is the symbol name.
        let chart_name = png_file
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(png_file);
        html.push_str(&format!(
            r#"        <div class="chart-container">
            <div class="chart-title">{chart_name}</div>
            <img src="{dir}/{png_file}" alt="{chart_name}" class="chart-image">
        </div>
"#,
            chart_name = chart_name,
            dir = CHART_DIR,
            png_file = png_file
        ));
    }

    html.push_str("    </div>\n</body>\n</html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_png_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["MSFT.png", "AAPL.png", "GOOG.png", "readme.txt"] {
            std::fs::write(dir.path().join(name), "x").expect("write file");
        }
        std::fs::create_dir(dir.path().join("archive")).expect("mkdir");
        std::fs::write(dir.path().join("archive").join("OLD.png"), "x").expect("write file");

        let files = find_png_files(dir.path()).expect("listing");
        assert_eq!(files, vec!["AAPL.png", "GOOG.png", "MSFT.png"]);
    }

    #[test]
    fn test_build_html_embeds_every_chart_in_order() {
        let files = vec!["AAPL.png".to_string(), "MSFT.png".to_string()];
        let html = build_html(&files, "2024-03-15 10:30:00");

        assert!(html.contains("Total Charts: 2"));
        assert!(html.contains("Generated on: 2024-03-15 10:30:00 UTC"));
        assert!(html.contains(r#"<img src="stock_png/AAPL.png" alt="AAPL""#));
        assert!(html.contains(r#"<div class="chart-title">MSFT</div>"#));
        assert!(html.find("AAPL").unwrap() < html.find("MSFT").unwrap());
    }

    #[test]
    fn test_empty_directory_writes_no_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("collage.html");

        let count = assemble(dir.path(), &output).expect("assemble");
        assert_eq!(count, None);
        assert!(!output.exists());
    }

    #[test]
    fn test_assemble_writes_document_and_counts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("AAPL.png"), "x").expect("write file");
        let output = dir.path().join("collage.html");

        let count = assemble(dir.path(), &output).expect("assemble");
        assert_eq!(count, Some(1));
        let html = std::fs::read_to_string(&output).expect("read collage");
        assert!(html.contains("AAPL"));
    }
}
