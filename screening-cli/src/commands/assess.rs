use std::{
    io::{self, BufRead, IsTerminal, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result, bail};
use clap::Args;
use client::{ClientError, FixedLocation, ProvidersSection, ResultView, SessionFlow};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AppContext, dialog, prompt, titled};

#[derive(Args, Debug, Clone, Copy)]
pub struct LocationArgs {
    /// Latitude used to find nearby care providers
    #[arg(long, allow_hyphen_values = true, requires = "longitude")]
    pub latitude: Option<f64>,

    /// Longitude used to find nearby care providers
    #[arg(long, allow_hyphen_values = true, requires = "latitude")]
    pub longitude: Option<f64>,
}

impl LocationArgs {
    /// No coordinates behaves like declined location access.
    fn provider(self) -> FixedLocation {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => FixedLocation::at(latitude, longitude),
            _ => FixedLocation::denied(),
        }
    }
}

#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Age of the person being assessed; prompted for when omitted
    #[arg(long, short)]
    pub age: Option<String>,

    /// Answers in question order, e.g. `yes,no,yes`; prompted for when omitted
    #[arg(long, value_delimiter = ',', value_parser = parse_answer)]
    pub answers: Option<Vec<bool>>,

    #[command(flatten)]
    pub location: LocationArgs,
}

fn parse_answer(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "1" | "true" => Ok(true),
        "n" | "no" | "0" | "false" => Ok(false),
        other => Err(format!("expected yes or no, got {other:?}")),
    }
}

/// Exit status after an interrupt outside a network step (128 + SIGINT).
const INTERRUPTED: i32 = 130;

/// Ctrl-C handling for one command.
///
/// While a network step is in flight an interrupt cancels `cancel`, so the
/// step ends with nothing staged. Anywhere else, prompts included, it ends the
/// process: a blocked stdin read never observes the token.
#[derive(Debug, Clone)]
struct Interrupt {
    cancel: CancellationToken,
    in_step: Arc<AtomicBool>,
}

impl Interrupt {
    /// Registers for SIGINT before returning, so no prompt runs unguarded.
    fn install() -> Result<Self> {
        #[cfg(unix)]
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .context("failed to listen for Ctrl-C")?;
        #[cfg(windows)]
        let mut sigint =
            tokio::signal::windows::ctrl_c().context("failed to listen for Ctrl-C")?;

        let interrupt = Self {
            cancel: CancellationToken::new(),
            in_step: Arc::new(AtomicBool::new(false)),
        };
        let handler = interrupt.clone();
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                if handler.in_step.load(Ordering::SeqCst) {
                    debug!("interrupt received; cancelling the current step");
                    handler.cancel.cancel();
                } else {
                    eprintln!();
                    std::process::exit(INTERRUPTED);
                }
            }
        });
        Ok(interrupt)
    }

    /// Runs a network step with Ctrl-C routed to the step's token.
    async fn step<F: Future>(&self, step: F) -> F::Output {
        self.in_step.store(true, Ordering::SeqCst);
        let output = step.await;
        self.in_step.store(false, Ordering::SeqCst);
        output
    }
}

pub async fn run(ctx: &AppContext, args: AssessArgs) -> Result<()> {
    let interrupt = Interrupt::install()?;
    let mut flow = ctx.flow()?;

    let age = match args.age {
        Some(age) => age,
        None => prompt("Age: ")?,
    };
    let count = interrupt
        .step(flow.submit_age(&age, &interrupt.cancel))
        .await
        .map_err(dialog)?;
    debug!(count, "questionnaire staged");

    let texts = flow.load_questionnaire().await.map_err(dialog)?.questions().texts();
    let answers = match args.answers {
        Some(answers) if answers.len() == texts.len() => answers,
        Some(answers) => bail!(
            "expected {} answers, one per question, but got {}",
            texts.len(),
            answers.len()
        ),
        None => ask_all(&texts)?,
    };
    for (id, answer) in answers.into_iter().enumerate() {
        flow.set_answer(id, answer).map_err(dialog)?;
    }

    submit(&mut flow, &interrupt).await?;
    println!("Assessment submitted. Processing your results...");
    println!();

    display_result(&mut flow, args.location, &interrupt).await
}

pub async fn show_result(ctx: &AppContext, location: &LocationArgs) -> Result<()> {
    let interrupt = Interrupt::install()?;
    let mut flow = ctx.flow()?;
    display_result(&mut flow, *location, &interrupt).await
}

/// Submits the answers, offering to resend them while the failure is one a
/// second attempt could fix.
async fn submit(flow: &mut SessionFlow, interrupt: &Interrupt) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    loop {
        let Err(err) = interrupt.step(flow.submit(&interrupt.cancel)).await else {
            return Ok(());
        };
        if !offer_retry(&err, interactive, &mut io::stdin().lock())? {
            return Err(titled("Submission Failed")(err));
        }
    }
}

/// Asks whether to resubmit after `err`. Only a terminal session is asked, and
/// only for transport, server, decode or storage failures.
fn offer_retry(err: &ClientError, interactive: bool, input: &mut impl BufRead) -> Result<bool> {
    let retryable = matches!(
        err,
        ClientError::Transport(_)
            | ClientError::Server { .. }
            | ClientError::Decode(_)
            | ClientError::Storage(_)
    );
    if !interactive || !retryable {
        return Ok(false);
    }

    eprintln!("Submission Failed: {err}");
    print!("Your answers are kept. Try again? [y/N] ");
    io::stdout().flush().ok();
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read answer")? == 0 {
        return Ok(false);
    }
    Ok(parse_answer(&line).unwrap_or(false))
}

async fn display_result(
    flow: &mut SessionFlow,
    location: LocationArgs,
    interrupt: &Interrupt,
) -> Result<()> {
    let provider = location.provider();
    let view = interrupt
        .step(flow.load_result(&provider, &interrupt.cancel))
        .await
        .map_err(dialog)?;
    print!("{}", render_result(&view));
    Ok(())
}

fn ask_all(texts: &[String]) -> Result<Vec<bool>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut answers = Vec::with_capacity(texts.len());

    for (index, text) in texts.iter().enumerate() {
        loop {
            print!("{}. {text} [y/N] ", index + 1);
            io::stdout().flush().ok();

            let mut line = String::new();
            if input.read_line(&mut line).context("failed to read answer")? == 0 {
                bail!("input ended before every question was answered");
            }
            if line.trim().is_empty() {
                answers.push(false);
                break;
            }
            match parse_answer(&line) {
                Ok(answer) => {
                    answers.push(answer);
                    break;
                }
                Err(err) => println!("{err}"),
            }
        }
    }
    Ok(answers)
}

fn render_result(view: &ResultView) -> String {
    let mut out = String::from("Assessment Result\n");
    out.push_str(view.message());
    out.push('\n');
    if let Some(group) = &view.age_group {
        out.push_str(&format!("Age group: {group}\n"));
    }

    match &view.providers {
        None => {}
        Some(ProvidersSection::Unavailable(message)) => {
            out.push_str(&format!("\nNearby care providers: {message}\n"));
        }
        Some(ProvidersSection::Listed(listings)) if listings.is_empty() => {
            out.push_str("\nNo care providers found nearby.\n");
        }
        Some(ProvidersSection::Listed(listings)) => {
            out.push_str("\nNearby care providers:\n");
            for (index, listing) in listings.iter().enumerate() {
                out.push_str(&format!(
                    "{:>3}. {} ({})\n     {}\n",
                    index + 1,
                    listing.name,
                    listing.distance,
                    listing.vicinity
                ));
            }
        }
    }
    out
}
