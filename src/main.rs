use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};

use patchlens_core::{ApplyOutcome, PatchText, PatchlensConfig};
use patchlens_review::{AnalysisAgent, PromptContext, ReviewPrompt, ReviewStore};
use patchlens_source::{locate, CommentAggregator, PatchFetcher};
use patchlens_workcopy::{PatchApplier, RepositoryManager};

#[derive(Parser)]
#[command(
    name = "patchlens",
    version,
    about = "Fetch a code change, apply it to a local checkout, and review it with an AI analysis agent",
    long_about = "Patchlens downloads the diff for a pull request, commit, or Phabricator\n\
                   differential, applies it onto a fresh branch of a local checkout, collects\n\
                   any existing review feedback, and hands everything to an external analysis\n\
                   agent as one prompt.\n\n\
                   Examples:\n  \
                     patchlens https://github.com/acme/widgets/pull/42\n  \
                     patchlens https://github.com/acme/widgets/commit/deadbeef -l C++\n  \
                     patchlens https://phabricator.services.mozilla.com/D123456 --no-apply\n  \
                     patchlens https://github.com/acme/widgets/pull/42 --no-checkout"
)]
struct Cli {
    /// GitHub pull request / commit URL, or Phabricator differential URL
    url: String,

    /// Programming language for the review context (default: Rust)
    #[arg(short, long)]
    language: Option<String>,

    /// Base directory for repository checkouts (default: ~/repos)
    #[arg(short = 'd', long)]
    base_dir: Option<PathBuf>,

    /// Additional questions to ask the analysis agent about the patch
    #[arg(short, long)]
    questions: Option<String>,

    /// Don't clone or update the repository; analyze the raw patch only
    #[arg(long)]
    no_checkout: bool,

    /// Don't apply the patch to the working copy; only analyze the diff
    #[arg(long)]
    no_apply: bool,

    /// Skip the interactive follow-up session after the analysis
    #[arg(long)]
    no_followup: bool,

    /// Path to configuration file (default: .patchlens.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

fn rule() -> String {
    "=".repeat(80)
}

fn print_banner(title: &str) {
    let rule = rule();
    println!("\n{rule}\n{title}\n{rule}\n");
}

fn print_completion(url: &str) {
    let rule = rule();
    println!("\n{rule}");
    println!("Analysis complete");
    println!("\nReviewed patch: {url}");
    println!("{rule}");
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PatchlensConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".patchlens.toml");
            if default_path.exists() {
                PatchlensConfig::from_file(default_path).into_diagnostic()?
            } else {
                PatchlensConfig::default()
            }
        }
    };

    let language = cli
        .language
        .clone()
        .unwrap_or_else(|| config.review.language.clone());
    let base_dir = cli
        .base_dir
        .clone()
        .unwrap_or_else(|| config.checkout.resolved_base_dir());
    let questions = cli.questions.clone().or_else(|| config.review.questions.clone());

    let descriptor = locate(&cli.url)
        .into_diagnostic()
        .wrap_err("resolving the change reference")?;
    eprintln!(
        "Repository: {}/{}",
        descriptor.change.owner(),
        descriptor.change.repo()
    );

    let fetcher = PatchFetcher::new().into_diagnostic()?;
    let aggregator =
        CommentAggregator::new(config.github.resolve_token()).into_diagnostic()?;

    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap(),
        );
        pb.set_message("Fetching patch and existing reviews...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    // Independent retrievals; either may fail without aborting the run.
    let (patch, comments) = tokio::join!(
        fetcher.fetch(&descriptor),
        aggregator.collect(&descriptor)
    );

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match &patch {
        PatchText::Fetched(text) => eprintln!("Downloaded patch ({} bytes)", text.len()),
        PatchText::Unavailable(reason) => eprintln!("Warning: {reason}"),
    }
    if comments.is_empty() {
        eprintln!("No existing comments found or unable to fetch");
    } else {
        eprintln!("Collected {} existing comments/reviews", comments.len());
    }

    let store = ReviewStore::in_current_dir().into_diagnostic()?;
    let previous = store.load_previous(&descriptor);
    if let Some(saved) = &previous {
        eprintln!(
            "Found previous review from {}",
            saved.saved_at.format("%Y-%m-%d %H:%M:%S")
        );
        eprintln!(
            "Review file: {}",
            store.review_path(&descriptor).display()
        );
    }

    let agent = AnalysisAgent::from_config(&config.agent);

    let (workcopy, apply_report) = if cli.no_checkout {
        eprintln!("Analyzing patch without repository checkout...");
        (None, None)
    } else {
        let manager = RepositoryManager::new(&base_dir);
        let workcopy = manager
            .ensure(&descriptor)
            .await
            .into_diagnostic()
            .wrap_err("preparing the working copy")?;

        let report = if cli.no_apply {
            None
        } else if let Some(text) = patch.content() {
            eprintln!("Applying patch...");
            let report = PatchApplier::new(&workcopy).apply(text).await;
            if let ApplyOutcome::Failed { diagnostics } = &report.outcome {
                eprintln!(
                    "Warning: failed to apply patch cleanly, continuing with the raw diff"
                );
                if cli.verbose {
                    eprintln!("{diagnostics}");
                }
            }
            Some(report)
        } else {
            None
        };
        (Some(workcopy), report)
    };

    let ctx = PromptContext {
        language: &language,
        url: &descriptor.url,
        patch: &patch,
        apply: apply_report.as_ref(),
        default_branch: workcopy.as_ref().map(|w| w.default_branch.as_str()),
        comments: &comments,
        previous_review: previous.as_ref().map(|p| p.content.as_str()),
        extra_questions: questions.as_deref(),
    };
    let prompt_dir = workcopy
        .as_ref()
        .map(|w| w.path.clone())
        .unwrap_or_else(std::env::temp_dir);
    let prompt = ReviewPrompt::compose(&ctx, &prompt_dir)
        .into_diagnostic()
        .wrap_err("persisting the review prompt")?;

    if cli.verbose {
        eprintln!("Prompt length: {} characters", prompt.text.len());
        eprintln!("Agent command: {}", agent.describe());
    }

    let workdir = workcopy.as_ref().map(|w| w.path.as_path());
    eprintln!(
        "Analyzing patch with {} ({language} context)...",
        agent.describe()
    );
    print_banner("ANALYSIS OUTPUT:");
    let analysis = agent
        .analyze(&prompt.text, workdir)
        .await
        .into_diagnostic()
        .wrap_err("running the analysis agent")?;

    print_completion(&descriptor.url);

    match store.save(&descriptor, &analysis) {
        Ok(path) => eprintln!("\nReview saved to: {}", path.display()),
        Err(e) => eprintln!("\nWarning: failed to save review output: {e}"),
    }
    eprintln!("Prompt saved to: {}", prompt.path.display());

    if !cli.no_followup && std::io::stdin().is_terminal() {
        run_followup(&agent, workdir, &descriptor.url).await;
    }

    Ok(())
}

async fn run_followup(agent: &AnalysisAgent, workdir: Option<&Path>, url: &str) {
    print_banner("INTERACTIVE FOLLOW-UP MODE");
    println!("You can now ask follow-up questions about the patch.");
    println!("Type your question and press Enter. Type 'exit' or 'quit' to finish.");

    loop {
        use std::io::Write;
        print!("\nYour question (or 'exit' to quit): ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        let Ok(read) = std::io::stdin().read_line(&mut line) else {
            break;
        };
        if read == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(
            question.to_lowercase().as_str(),
            "exit" | "quit" | "q" | "done"
        ) {
            break;
        }

        print_banner("AGENT RESPONSE:");
        if let Err(e) = agent.analyze(question, workdir).await {
            eprintln!("\nWarning: {e}");
            eprintln!("You can try again or type 'exit' to quit.");
        }
    }

    println!("\nExiting interactive mode...");
    print_completion(url);
}
