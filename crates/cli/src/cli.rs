// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tb_core::{CardId, CardKind, CardStatus};

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Board:
  watch       Follow the board of every issue under test
  list        Show the cards of one or more issues

Cards:
  new         Record a new finding
  edit        Change a card's fields
  move        Move a card to another column
  delete      Delete a card
  attach      Attach an image to a card
  detach      Remove an image from a card

Reporting:
  export      Post an issue's test report to the tracker
";

const QUICKSTART_HELP: &str = "\
Get started:
  tb watch                                      Follow the live board
  tb new ESCIO-42 --ref AC1 --summary \"Crash\"   Record a finding
  tb move 17 closed                             Validate a fix
  tb export ESCIO-42                            Post the report";

#[derive(Parser)]
#[command(name = "tb")]
#[command(about = "Shared board of test findings for issues under test")]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file (default: $TESTBOARD_CONFIG, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Follow the board of every issue under test until interrupted
    Watch {
        /// Only show cards recorded by this tester
        #[arg(long)]
        tester: Option<String>,
    },

    /// Show the cards of one or more issues
    #[command(arg_required_else_help = true)]
    List {
        /// Issue key(s)
        #[arg(required = true)]
        keys: Vec<String>,

        /// Only show cards recorded by this tester
        #[arg(long)]
        tester: Option<String>,
    },

    /// Record a new finding on an issue
    #[command(after_help = "Examples:\n  \
        tb new ESCIO-42 --ref AC1 --summary \"Login fails\"          Open error\n  \
        tb new ESCIO-42 --ref AC2 --kind ux --summary \"Tiny font\"  UX finding\n  \
        tb new ESCIO-42 --ref AC3 --summary \"Fixed?\" -s pending    Straight to pending")]
    New {
        /// Issue key the finding belongs to
        key: String,

        /// Acceptance criterion or test case reference
        #[arg(long = "ref", value_name = "REF")]
        reference: String,

        /// Nature of the finding (error, question, proposal, ux)
        #[arg(long, short, default_value = "error")]
        kind: CardKind,

        /// One-line description
        #[arg(long)]
        summary: String,

        /// Longer description
        #[arg(long, short)]
        detail: Option<String>,

        /// Starting column (pending, open_error, closed, discarded)
        #[arg(long, short, default_value = "open_error")]
        status: CardStatus,
    },

    /// Change a card's fields
    #[command(
        arg_required_else_help = true,
        after_help = "Examples:\n  \
            tb edit 17 --summary \"Crash on save\"     Update the summary\n  \
            tb edit 17 --reply \"Fixed in 2.3\"        Record the developer reply\n  \
            tb edit 17 --detail \"\"                   Clear the detail"
    )]
    Edit {
        /// Card id
        id: CardId,

        #[command(flatten)]
        fields: EditFields,
    },

    /// Move a card to another column
    #[command(arg_required_else_help = true)]
    Move {
        /// Card id or drag payload
        card: String,

        /// Target column (pending, open_error, closed, discarded)
        status: CardStatus,
    },

    /// Delete a card
    #[command(arg_required_else_help = true)]
    Delete {
        /// Card id
        id: CardId,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Post an issue's test report to the tracker as a comment
    #[command(arg_required_else_help = true)]
    Export {
        /// Issue key
        key: String,

        /// Print the report without posting it
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Attach an image file to a card
    #[command(arg_required_else_help = true)]
    Attach {
        /// Card id
        id: CardId,

        /// Image file
        file: PathBuf,

        /// Issue the card belongs to (default: every issue under test)
        #[arg(long, short)]
        issue: Option<String>,
    },

    /// Remove an image from a card and delete it
    #[command(arg_required_else_help = true)]
    Detach {
        /// Card id
        id: CardId,

        /// Image URL as listed on the card
        url: String,

        /// Issue the card belongs to (default: every issue under test)
        #[arg(long, short)]
        issue: Option<String>,
    },
}

/// Fields accepted by `tb edit`. An empty value clears an optional field.
#[derive(Args, Debug, Default, Clone)]
pub struct EditFields {
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    #[arg(long, short)]
    pub kind: Option<CardKind>,

    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long, short)]
    pub detail: Option<String>,

    #[arg(long, short)]
    pub status: Option<CardStatus>,

    #[arg(long)]
    pub tester: Option<String>,

    /// Developer reply
    #[arg(long)]
    pub reply: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
