use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use std::io::Write;
use stream_resolver::{
    StreamDescriptor,
    extractor::platforms::animesaturn::{AnimeEntry, Episode},
};
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

/// Anything listed as a `title` / `url` pair.
pub trait Listing {
    fn title(&self) -> &str;
    fn url(&self) -> &str;
}

impl Listing for AnimeEntry {
    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl Listing for Episode {
    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_streams(
        &self,
        streams: &[StreamDescriptor],
        format: &OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => self.format_json(&streams, true),
            OutputFormat::JsonCompact => self.format_json(&streams, false),
            OutputFormat::Pretty => Ok(self.format_streams_pretty(streams)),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.format_streams_table(streams)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => Ok(self.format_streams_pretty(streams)),
        }
    }

    /// A single optional stream; JSON modes print `{"url": null}` when absent.
    pub fn format_stream(
        &self,
        stream: Option<&StreamDescriptor>,
        format: &OutputFormat,
    ) -> Result<String> {
        match (stream, format) {
            (Some(stream), OutputFormat::Json) => self.format_json(stream, true),
            (Some(stream), OutputFormat::JsonCompact) => self.format_json(stream, false),
            (None, OutputFormat::Json) => self.format_json(&serde_json::json!({ "url": null }), true),
            (None, OutputFormat::JsonCompact) => {
                self.format_json(&serde_json::json!({ "url": null }), false)
            }
            (stream, _) => {
                let streams: Vec<StreamDescriptor> = stream.into_iter().cloned().collect();
                self.format_streams(&streams, format)
            }
        }
    }

    pub fn format_listing<T>(&self, heading: &str, items: &[T], format: &OutputFormat) -> Result<String>
    where
        T: Listing + Serialize,
    {
        match format {
            OutputFormat::Json => self.format_json(&items, true),
            OutputFormat::JsonCompact => self.format_json(&items, false),
            OutputFormat::Pretty => Ok(self.format_listing_pretty(heading, items)),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.format_listing_table(items)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => Ok(self.format_listing_pretty(heading, items)),
        }
    }

    fn format_json<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<String> {
        let mut out = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        out.push('\n');
        Ok(out)
    }

    fn format_streams_pretty(&self, streams: &[StreamDescriptor]) -> String {
        if streams.is_empty() {
            return format!("{}\n", self.colorize("No streams found", &Color::Yellow, true));
        }

        let mut output = String::new();
        output.push_str(&self.colorize(
            &format!("Streams ({}):", streams.len()),
            &Color::Green,
            true,
        ));
        output.push('\n');

        for (i, stream) in streams.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} [{}]\n",
                i + 1,
                self.colorize(&stream.server_label, &Color::Cyan, true),
                self.colorize(&stream.quality, &Color::Yellow, false)
            ));
            output.push_str(&format!(
                "     {}: {}\n",
                self.colorize("URL", &Color::Yellow, false),
                self.colorize(&stream.url, &Color::Blue, false)
            ));
            for (key, value) in &stream.headers {
                output.push_str(&format!(
                    "     {}: {}\n",
                    self.colorize(key, &Color::Green, false),
                    value
                ));
            }
        }
        output
    }

    #[cfg(feature = "table-output")]
    fn format_streams_table(&self, streams: &[StreamDescriptor]) -> String {
        #[derive(Tabled)]
        struct StreamRow<'a> {
            server: &'a str,
            quality: &'a str,
            url: &'a str,
            referer: &'a str,
        }

        let rows = streams.iter().map(|s| StreamRow {
            server: &s.server_label,
            quality: &s.quality,
            url: &s.url,
            referer: s.referer().unwrap_or(""),
        });
        let mut table = Table::new(rows).with(Style::modern()).to_string();
        table.push('\n');
        table
    }

    fn format_listing_pretty<T: Listing>(&self, heading: &str, items: &[T]) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(
            &format!("{heading} ({}):", items.len()),
            &Color::Green,
            true,
        ));
        output.push('\n');
        for item in items {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize(item.title(), &Color::Cyan, false),
                self.colorize(item.url(), &Color::Blue, false)
            ));
        }
        output
    }

    #[cfg(feature = "table-output")]
    fn format_listing_table<T: Listing>(&self, items: &[T]) -> String {
        #[derive(Tabled)]
        struct ListingRow<'a> {
            title: &'a str,
            url: &'a str,
        }

        let rows = items.iter().map(|item| ListingRow {
            title: item.title(),
            url: item.url(),
        });
        let mut table = Table::new(rows).with(Style::modern()).to_string();
        table.push('\n');
        table
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (self.colored, color, bold);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
