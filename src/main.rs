//! cmdhost demo binary.
//!
//! A small command tree exercising options, base groups, sub-commands,
//! global filters and cancellation.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use cmdhost::cli::Host;
use cmdhost::core::config::{Config, HostConfig};
use cmdhost::engine::filters::{CancellationFilter, TracingFilter};
use cmdhost::engine::{Command, CommandError, Invocation};
use cmdhost::logging::init_logging;
use cmdhost::metadata::{Declaration, Options};

const APP: &str = "cmdhost";

/// Options shared by several commands.
#[derive(Debug, Default)]
struct Output {
    verbose: bool,
}

impl Options for Output {
    fn declare(decl: &mut Declaration<Self>) {
        decl.option("verbose", |o: &mut Output, v: bool| o.verbose = v)
            .alias("-v")
            .description("Print extra detail");
    }
}

#[derive(Debug, Default)]
struct Greet {
    output: Output,
    name: String,
    shout: bool,
    times: u8,
    style: String,
}

impl Options for Greet {
    fn declare(decl: &mut Declaration<Self>) {
        decl.extends(|g: &mut Greet| &mut g.output);
        decl.option("name", |g: &mut Greet, v: String| g.name = v)
            .alias("-n")
            .default("world")
            .description("Who to greet")
            .order(1);
        decl.option("shout", |g: &mut Greet, v: bool| g.shout = v)
            .description("Greet in upper case")
            .order(0);
        decl.option("times", |g: &mut Greet, v: u8| g.times = v)
            .default(1u8)
            .description("Number of greetings");
        decl.option("style", |g: &mut Greet, v: String| g.style = v)
            .description("Greeting style")
            .completions(["plain", "fancy"]);
    }
}

#[async_trait]
impl Command for Greet {
    const NAME: &'static str = "greet";
    const DESCRIPTION: Option<&'static str> = Some("Print a greeting");

    async fn execute(&mut self, invocation: &Invocation) -> Result<()> {
        if self.output.verbose {
            eprintln!("invocation {}", invocation.id());
        }
        let mut greeting = format!("Hello, {}!", self.name);
        if self.style == "fancy" {
            greeting = format!("*** {} ***", greeting);
        }
        if self.shout {
            greeting = greeting.to_uppercase();
        }
        for _ in 0..self.times {
            println!("{}", greeting);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Remote {
    output: Output,
}

impl Options for Remote {
    fn declare(decl: &mut Declaration<Self>) {
        decl.extends(|r: &mut Remote| &mut r.output);
    }
}

#[async_trait]
impl Command for Remote {
    const NAME: &'static str = "remote";
    const DESCRIPTION: Option<&'static str> = Some("Manage remotes");

    async fn execute(&mut self, _invocation: &Invocation) -> Result<()> {
        println!("no remotes configured");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RemoteAdd {
    name: String,
    url: String,
}

impl Options for RemoteAdd {
    fn declare(decl: &mut Declaration<Self>) {
        decl.option("url", |r: &mut RemoteAdd, v: String| r.url = v)
            .required()
            .description("Remote URL");
        decl.option("name", |r: &mut RemoteAdd, v: String| r.name = v)
            .default("origin")
            .description("Remote name");
    }
}

#[async_trait]
impl Command for RemoteAdd {
    const NAME: &'static str = "add";
    const DESCRIPTION: Option<&'static str> = Some("Add a remote");

    async fn execute(&mut self, _invocation: &Invocation) -> Result<()> {
        if self.url.is_empty() {
            bail!("remote url must not be empty");
        }
        println!("added {} -> {}", self.name, self.url);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Wait {
    seconds: u64,
}

impl Options for Wait {
    fn declare(decl: &mut Declaration<Self>) {
        decl.option("seconds", |w: &mut Wait, v: u64| w.seconds = v)
            .default(1u64)
            .description("How long to wait");
    }
}

#[async_trait]
impl Command for Wait {
    const NAME: &'static str = "wait";
    const DESCRIPTION: Option<&'static str> = Some("Wait, honoring Ctrl-C");

    async fn execute(&mut self, invocation: &Invocation) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(self.seconds)) => {
                println!("waited {}s", self.seconds);
                Ok(())
            }
            _ = invocation.cancellation().cancelled() => Err(CommandError::Cancelled.into()),
        }
    }
}

fn build_host(config: HostConfig) -> Result<Host> {
    let host = Host::builder(APP)
        .about("Declarative command hosting demo")
        .version(env!("CARGO_PKG_VERSION"))
        .config(config)
        .add_command::<Greet>()
        .add_command::<Remote>()
        .add_sub_command::<Remote, RemoteAdd>()
        .add_command::<Wait>()
        .use_filter::<TracingFilter>(-100)
        .use_filter::<CancellationFilter>(-50)
        .register_filter(TracingFilter)
        .register_filter(CancellationFilter)
        .build()?;
    Ok(host)
}

async fn start() -> Result<i32> {
    let loaded = Config::load(APP)?;
    init_logging(&loaded.config.host.logging)?;
    if let Some(path) = loaded.config.loaded_from() {
        debug!(path = %path.display(), "config loaded");
    }

    let host = build_host(loaded.config.host)?;
    Ok(host.run(std::env::args_os()).await)
}

#[tokio::main]
async fn main() {
    let code = match start().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}
