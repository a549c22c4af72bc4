//! CLI command definitions

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tradebinder")]
#[command(about = "Tradebinder - peer-to-peer trading card marketplace", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted two-party trade from proposal to binder update
    Demo,

    /// Manage trade proposals
    Proposal {
        #[command(subcommand)]
        action: ProposalAction,
    },

    /// Act at the physical meeting
    Meeting {
        #[command(subcommand)]
        action: MeetingAction,
    },

    /// Query information
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProposalAction {
    /// Create a new proposal
    Create {
        /// Proposing user id
        #[arg(long)]
        proposer: String,

        /// Receiving user id
        #[arg(long)]
        receiver: String,

        /// Offered card, as <card-id>:<quantity> (repeatable)
        #[arg(short, long)]
        offer: Vec<String>,

        /// Requested card, as <card-id>:<quantity> (repeatable)
        #[arg(short, long)]
        request: Vec<String>,

        /// Store or user hosting the meeting
        #[arg(short, long)]
        place: String,

        /// Meeting date (YYYY-MM-DD), must be in the future
        #[arg(short, long)]
        date: NaiveDate,

        /// Meeting time (HH:MM:SS), optional
        #[arg(short, long)]
        time: Option<NaiveTime>,
    },

    /// Accept a pending proposal
    Accept {
        /// Proposal ID to accept
        proposal_id: String,
    },

    /// Decline a pending proposal
    Decline {
        /// Proposal ID to decline
        proposal_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MeetingAction {
    /// Confirm presence at the meeting point, printing the session code
    Arrive {
        /// Transaction ID
        transaction_id: u64,

        /// Arriving user id
        #[arg(short, long)]
        user: String,
    },

    /// Record an inspection outcome
    Inspect {
        /// Transaction ID
        transaction_id: u64,

        /// Inspecting user id
        #[arg(short, long)]
        user: String,

        /// Outcome (pass or fail)
        #[arg(short, long)]
        outcome: String,
    },

    /// Cancel an unresolved transaction
    Cancel {
        /// Transaction ID
        transaction_id: u64,
    },

    /// Leave feedback on a resolved transaction
    Feedback {
        /// Transaction ID
        transaction_id: u64,

        /// Authoring user id
        #[arg(short, long)]
        user: String,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Free-form comment
        #[arg(short, long, default_value = "")]
        comment: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryAction {
    /// Proposals a user sent that are pending or expired
    SentPending {
        /// User id
        user: String,
    },

    /// Proposals a user received that are pending or expired
    ReceivedPending {
        /// User id
        user: String,
    },

    /// Accepted proposals with a meeting ahead
    Scheduled {
        /// User id
        user: String,
    },

    /// Resolved proposals in a user's history
    History {
        /// User id
        user: String,
    },

    /// Show one transaction's per-party state
    Transaction {
        /// Transaction ID
        transaction_id: u64,
    },
}
