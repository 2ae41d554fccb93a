// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stepmark CLI entrypoint.
//!
//! By default this replays a response file (or the built-in demo) in the interactive viewer,
//! chunk by chunk. `--print` renders the complete response once to stdout instead.

use std::error::Error;
use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;

use stepmark::locale::{Catalog, Lang};
use stepmark::model::ResponseFlow;
use stepmark::render::RenderOptions;
use stepmark::stream::{ChunkFeeder, StreamBuffer};
use stepmark::tui::{self, TuiConfig, DEFAULT_CHUNK_BYTES, DEFAULT_TICK};
use stepmark::view::{
    paint_solution_text, paint_text, MarkdownRenderer, PaintOptions, SolutionRenderer,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STEPMARK_LOG";
const LOG_FILE_ENV: &str = "STEPMARK_LOG_FILE";
const DEFAULT_LOG_FILTER: &str = "warn";
const DEFAULT_PRINT_WIDTH: usize = 80;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<response-file>] [--flow solve|improve|chat] [--chunk-bytes <n>] [--tick-ms <n>] [--lang en|zh]\n  {program} --demo [--flow solve|chat] [--chunk-bytes <n>] [--tick-ms <n>] [--lang en|zh]\n  {program} [<response-file>] --print [--json] [--width <n>] [--flow solve|improve|chat] [--lang en|zh]\n\nWithout a response file the built-in demo is replayed.\n--print renders the complete response once to stdout instead of opening the viewer.\n--json (with --print) emits the split problem sections as JSON; not available for chat.\n\n{LOG_ENV} sets the log filter (default {DEFAULT_LOG_FILTER}); in the viewer logs go to the file named by {LOG_FILE_ENV}."
    );
}

/// Response protocol selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowArg {
    Solve,
    Improve,
    Chat,
}

impl FlowArg {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "solve" => Some(Self::Solve),
            "improve" => Some(Self::Improve),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }

    fn response_flow(self) -> Option<ResponseFlow> {
        match self {
            Self::Solve => Some(ResponseFlow::Solve),
            Self::Improve => Some(ResponseFlow::Improve),
            Self::Chat => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    response_file: Option<String>,
    demo: bool,
    flow: Option<FlowArg>,
    chunk_bytes: Option<usize>,
    tick_ms: Option<u64>,
    lang: Option<Lang>,
    print: bool,
    json: bool,
    width: Option<usize>,
}

fn parse_count(raw: Option<String>) -> Result<usize, ()> {
    let value: usize = raw.ok_or(())?.parse().map_err(|_| ())?;
    if value == 0 {
        return Err(());
    }
    Ok(value)
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--print" => {
                if options.print {
                    return Err(());
                }
                options.print = true;
            }
            "--json" => {
                if options.json {
                    return Err(());
                }
                options.json = true;
            }
            "--flow" => {
                if options.flow.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.flow = Some(FlowArg::parse(&raw).ok_or(())?);
            }
            "--chunk-bytes" => {
                if options.chunk_bytes.is_some() {
                    return Err(());
                }
                options.chunk_bytes = Some(parse_count(args.next())?);
            }
            "--tick-ms" => {
                if options.tick_ms.is_some() {
                    return Err(());
                }
                options.tick_ms = Some(parse_count(args.next())? as u64);
            }
            "--lang" => {
                if options.lang.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.lang = Some(raw.parse().map_err(|_| ())?);
            }
            "--width" => {
                if options.width.is_some() {
                    return Err(());
                }
                options.width = Some(parse_count(args.next())?);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.response_file.is_some() {
                    return Err(());
                }
                options.response_file = Some(arg);
            }
        }
    }

    if options.demo && options.response_file.is_some() {
        return Err(());
    }

    if (options.json || options.width.is_some()) && !options.print {
        return Err(());
    }

    if options.json && options.flow == Some(FlowArg::Chat) {
        return Err(());
    }

    if options.demo && options.flow == Some(FlowArg::Improve) {
        return Err(());
    }

    Ok(options)
}

/// Installs the log subscriber. The viewer owns the terminal, so it only logs to a file.
fn init_tracing(print: bool) -> Result<(), Box<dyn Error>> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if print {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return Ok(());
    }

    if let Some(path) = std::env::var_os(LOG_FILE_ENV) {
        let file = File::create(path)?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
    Ok(())
}

fn load_response(options: &CliOptions) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &options.response_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let chat = options.flow == Some(FlowArg::Chat);
    Ok(if chat { tui::DEMO_CHAT } else { tui::DEMO_RESPONSE }.to_owned())
}

fn print_response(options: &CliOptions, response: &str) -> Result<(), Box<dyn Error>> {
    let flow = options.flow.unwrap_or(FlowArg::Solve).response_flow();
    let lang = options.lang.unwrap_or_else(Lang::from_env);

    if options.json {
        let flow = flow.unwrap_or_default();
        let sections = stepmark::format::split_problems(response, flow);
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    // Replays the chunks through one renderer so the output matches what the viewer settles on.
    let chunk_bytes = options.chunk_bytes.unwrap_or(response.len());
    let mut feeder = ChunkFeeder::new(response, chunk_bytes);
    let mut buffer = StreamBuffer::new();
    let paint = PaintOptions {
        width: options.width.unwrap_or(DEFAULT_PRINT_WIDTH),
        ..PaintOptions::default()
    };

    let text = match flow {
        None => {
            let mut renderer = MarkdownRenderer::new(Catalog::new(lang), RenderOptions::default());
            let mut tree = renderer.render(buffer.as_str());
            while let Some(chunk) = feeder.next_chunk() {
                buffer.push_str(chunk);
                tree = renderer.render(buffer.as_str());
            }
            paint_text(&tree, renderer.mounts(), &paint)
        }
        Some(flow) => {
            let mut renderer = SolutionRenderer::new(Catalog::new(lang), RenderOptions::default());
            let mut views = renderer.render(buffer.as_str(), flow);
            while let Some(chunk) = feeder.next_chunk() {
                buffer.push_str(chunk);
                views = renderer.render(buffer.as_str(), flow);
            }
            paint_solution_text(&views, renderer.mounts(), renderer.localizer(), &paint)
        }
    };
    print!("{text}");
    Ok(())
}

fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "stepmark".to_owned());

    let options = match parse_options(args) {
        Ok(options) => options,
        Err(()) => {
            print_usage(&program);
            std::process::exit(2);
        }
    };

    let result = (|| -> Result<(), Box<dyn Error>> {
        init_tracing(options.print)?;
        let response = load_response(&options)?;

        if options.print {
            return print_response(&options, &response);
        }

        let config = TuiConfig {
            response,
            flow: options.flow.unwrap_or(FlowArg::Solve).response_flow(),
            chunk_bytes: options.chunk_bytes.unwrap_or(DEFAULT_CHUNK_BYTES),
            tick: options.tick_ms.map_or(DEFAULT_TICK, Duration::from_millis),
            lang: options.lang.unwrap_or_else(Lang::from_env),
            options: RenderOptions::default(),
        };
        tracing::debug!(
            bytes = config.response.len(),
            chunk_bytes = config.chunk_bytes,
            "starting viewer"
        );
        tui::run(config)
    })();

    if let Err(err) = result {
        eprintln!("stepmark: {err}");
        std::process::exit(1);
    }
}
