//! Tradebinder CLI binary

use clap::Parser;
use tradebinder::cli::{Cli, Commands, MarketApp, MeetingAction, ProposalAction, QueryAction};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => {
            tracing::info!("Running the scripted two-party trade demo");

            let app = MarketApp::new();
            app.run_demo().await?;

            tracing::info!("Demo finished");
        }

        Commands::Proposal { action } => {
            // Proposal commands need a running marketplace service holding the
            // stores. For MVP, we'll note this limitation.
            tracing::error!("Proposal commands require a running marketplace service. Try: tradebinder demo");
            tracing::info!("Future: These commands will communicate with a running service via IPC");

            // Show what would be executed
            match action {
                ProposalAction::Create {
                    proposer,
                    receiver,
                    offer,
                    request,
                    place,
                    date,
                    time,
                } => {
                    tracing::info!(
                        "Would create proposal from {} to {}: {} offered, {} requested, meeting at {} on {} {}",
                        proposer,
                        receiver,
                        offer.len(),
                        request.len(),
                        place,
                        date,
                        time.map(|t| t.to_string()).unwrap_or_default()
                    );
                }
                ProposalAction::Accept { proposal_id } => {
                    tracing::info!("Would accept proposal: {}", proposal_id);
                }
                ProposalAction::Decline { proposal_id } => {
                    tracing::info!("Would decline proposal: {}", proposal_id);
                }
            }
        }

        Commands::Meeting { action } => {
            tracing::error!("Meeting commands require a running marketplace service. Try: tradebinder demo");
            tracing::info!("Future: These commands will communicate with a running service via IPC");

            match action {
                MeetingAction::Arrive {
                    transaction_id,
                    user,
                } => {
                    tracing::info!(
                        "Would confirm {} present on transaction {} and print their session code",
                        user,
                        transaction_id
                    );
                }
                MeetingAction::Inspect {
                    transaction_id,
                    user,
                    outcome,
                } => {
                    tracing::info!(
                        "Would record inspection {} by {} on transaction {}",
                        outcome,
                        user,
                        transaction_id
                    );
                }
                MeetingAction::Cancel { transaction_id } => {
                    tracing::info!("Would cancel transaction: {}", transaction_id);
                }
                MeetingAction::Feedback {
                    transaction_id,
                    user,
                    rating,
                    comment,
                } => {
                    tracing::info!(
                        "Would record feedback {}/5 by {} on transaction {}: {}",
                        rating,
                        user,
                        transaction_id,
                        comment
                    );
                }
            }
        }

        Commands::Query { action } => {
            tracing::error!("Query commands require a running marketplace service. Try: tradebinder demo");
            tracing::info!("Future: These commands will communicate with a running service via IPC");

            match action {
                QueryAction::SentPending { user } => {
                    tracing::info!("Would list pending proposals sent by {}", user);
                }
                QueryAction::ReceivedPending { user } => {
                    tracing::info!("Would list pending proposals received by {}", user);
                }
                QueryAction::Scheduled { user } => {
                    tracing::info!("Would list scheduled meetings for {}", user);
                }
                QueryAction::History { user } => {
                    tracing::info!("Would list resolved proposals for {}", user);
                }
                QueryAction::Transaction { transaction_id } => {
                    tracing::info!("Would show transaction: {}", transaction_id);
                }
            }
        }
    }

    Ok(())
}
