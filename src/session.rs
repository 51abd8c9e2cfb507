//! Interactive run controller.
//!
//! A run moves through a fixed sequence of stages: collect the subject and
//! token, fetch both relationship lists, diff them, ask for global
//! confirmation, then walk the non-reciprocal accounts one by one. Every
//! path ends in `Done`, which reports the tally.

use crate::console::{parse_confirmation, Console, Directive};
use crate::error::{ExitStatus, GitHubError, UnfollowerError};
use crate::github::{Credential, FollowGraph};
use crate::relationship::non_reciprocal;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

const RULE: &str = "------------------------------";

/// Which relationship list a fetch was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Following,
    Followers,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Following => f.write_str("following"),
            Relation::Followers => f.write_str("followers"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Subject or token was empty; no request was made.
    MissingInput,
    FetchFailed {
        relation: Relation,
        error: GitHubError,
    },
    FullyReciprocal,
    /// The global confirmation was not affirmative.
    Declined,
    /// Every non-reciprocal account was answered.
    Completed,
    /// `quit` was given part way through the per-account loop.
    Stopped { remaining: usize },
}

/// Per-run counters. Discarded when the process exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempted: usize,
    pub unfollowed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: usize,
}

impl Tally {
    pub fn unfollowed_count(&self) -> usize {
        self.unfollowed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub non_reciprocal: Vec<String>,
    pub tally: Tally,
}

impl RunReport {
    pub fn exit_status(&self) -> ExitStatus {
        match self.outcome {
            Outcome::FullyReciprocal | Outcome::Completed => ExitStatus::Success,
            Outcome::FetchFailed { .. } => ExitStatus::FetchFailed,
            Outcome::MissingInput | Outcome::Declined | Outcome::Stopped { .. } => {
                ExitStatus::Aborted
            }
        }
    }
}

enum Stage {
    FetchFollowing,
    FetchFollowers {
        following: HashSet<String>,
    },
    Diffed {
        following: HashSet<String>,
        followers: HashSet<String>,
    },
    AwaitGlobalConfirm,
    PerItemLoop,
    Done(Outcome),
}

pub struct Session<'a, C: Console> {
    console: &'a mut C,
    pending: Vec<String>,
    tally: Tally,
}

impl<'a, C: Console> Session<'a, C> {
    pub fn new(console: &'a mut C) -> Self {
        Self {
            console,
            pending: Vec::new(),
            tally: Tally::default(),
        }
    }

    /// Run the whole interactive flow. `connect` builds the API client once the
    /// token is known; it is not called when the subject or token is empty.
    pub async fn run<G, F>(mut self, connect: F) -> Result<RunReport, UnfollowerError>
    where
        G: FollowGraph,
        F: FnOnce(Credential) -> Result<G, GitHubError>,
    {
        // Collect subject and token
        self.console.say("--- GitHub Unfollower ---");
        self.console
            .say("Finds accounts you follow that don't follow you back, and unfollows them if you ask.");

        let subject = self
            .console
            .read_line("Enter your GitHub username")?
            .trim()
            .to_string();
        self.console.say("");
        self.console
            .say("Please provide a GitHub Personal Access Token (PAT).");
        self.console
            .say("It needs the 'user:follow' scope to unfollow users.");
        self.console
            .say("Your token will not be displayed as you type.");
        let credential = Credential::new(self.console.read_secret("Enter your GitHub PAT")?);

        // Validate input before any request is made
        if subject.is_empty() || credential.is_empty() {
            return Ok(self.finish(Outcome::MissingInput));
        }

        // Create the API client
        let graph = match connect(credential) {
            Ok(graph) => graph,
            Err(error) => {
                return Ok(self.finish(Outcome::FetchFailed {
                    relation: Relation::Following,
                    error,
                }))
            }
        };

        // Drive the stages until one settles on an outcome
        let mut stage = Stage::FetchFollowing;
        loop {
            stage = match stage {
                Stage::Done(outcome) => return Ok(self.finish(outcome)),
                other => self.step(&graph, &subject, other).await?,
            };
        }
    }

    async fn step<G: FollowGraph>(
        &mut self,
        graph: &G,
        subject: &str,
        stage: Stage,
    ) -> Result<Stage, UnfollowerError> {
        let next = match stage {
            Stage::FetchFollowing => {
                match self.fetch(graph, subject, Relation::Following).await {
                    Ok(following) => {
                        self.console
                            .say(&format!("Found {} users you follow.", following.len()));
                        Stage::FetchFollowers { following }
                    }
                    Err(error) => Stage::Done(Outcome::FetchFailed {
                        relation: Relation::Following,
                        error,
                    }),
                }
            }
            Stage::FetchFollowers { following } => {
                match self.fetch(graph, subject, Relation::Followers).await {
                    Ok(followers) => {
                        self.console
                            .say(&format!("Found {} followers.", followers.len()));
                        Stage::Diffed {
                            following,
                            followers,
                        }
                    }
                    Err(error) => Stage::Done(Outcome::FetchFailed {
                        relation: Relation::Followers,
                        error,
                    }),
                }
            }
            Stage::Diffed {
                following,
                followers,
            } => {
                // Sorted by handle; the per-account loop walks this order
                self.pending = non_reciprocal(&following, &followers).into_iter().collect();
                info!(
                    following = following.len(),
                    followers = followers.len(),
                    non_reciprocal = self.pending.len(),
                    "Computed relationship difference"
                );
                self.console.say(RULE);
                if self.pending.is_empty() {
                    Stage::Done(Outcome::FullyReciprocal)
                } else {
                    Stage::AwaitGlobalConfirm
                }
            }
            Stage::AwaitGlobalConfirm => {
                // Show the full list before asking once for all of it
                self.console.say("");
                self.console.say(&format!(
                    "Found {} users who do not follow you back:",
                    self.pending.len()
                ));
                for handle in &self.pending {
                    self.console.say(&format!("- {handle}"));
                }
                self.console.say(RULE);

                let answer = self
                    .console
                    .read_line("Do you want to unfollow these users? (yes/no)")?;
                // Anything but yes/y leaves every follow in place
                if parse_confirmation(&answer) {
                    self.console.say("");
                    self.console.say("Starting the unfollow process...");
                    Stage::PerItemLoop
                } else {
                    Stage::Done(Outcome::Declined)
                }
            }
            Stage::PerItemLoop => self.confirm_each(graph).await?,
            // Terminal; handled by the caller
            Stage::Done(outcome) => Stage::Done(outcome),
        };
        Ok(next)
    }

    async fn fetch<G: FollowGraph>(
        &mut self,
        graph: &G,
        subject: &str,
        relation: Relation,
    ) -> Result<HashSet<String>, GitHubError> {
        let message = match relation {
            Relation::Following => format!("Fetching list of users {subject} is following..."),
            Relation::Followers => format!("Fetching list of {subject}'s followers..."),
        };
        self.console.begin_task(&message);

        // The spinner is cleared whether or not the fetch succeeded
        let result = match relation {
            Relation::Following => graph.following(subject).await,
            Relation::Followers => graph.followers(subject).await,
        };
        self.console.end_task();

        let accounts = result?;
        debug!("Fetched {} {} accounts", accounts.len(), relation);
        Ok(accounts.into_iter().map(|account| account.login).collect())
    }

    /// Walk the pending handles in order. `all` latches acceptance for the rest;
    /// `quit` leaves the remaining handles untouched.
    async fn confirm_each<G: FollowGraph>(&mut self, graph: &G) -> Result<Stage, UnfollowerError> {
        let pending = std::mem::take(&mut self.pending);
        let mut accept_remaining = false;

        for (index, handle) in pending.iter().enumerate() {
            let directive = if accept_remaining {
                Directive::Accept
            } else {
                let answer = self
                    .console
                    .read_line(&format!("Unfollow {handle}? (y/n/all/quit)"))?;
                Directive::parse(&answer)
            };

            match directive {
                Directive::Quit => {
                    let remaining = pending.len() - index;
                    info!("Stopped with {} accounts unprocessed", remaining);
                    self.pending = pending;
                    return Ok(Stage::Done(Outcome::Stopped { remaining }));
                }
                Directive::AcceptAll => {
                    accept_remaining = true;
                    self.unfollow_one(graph, handle).await;
                }
                Directive::Accept => self.unfollow_one(graph, handle).await,
                Directive::Decline => {
                    self.tally.skipped += 1;
                    self.console.say(&format!("Skipping {handle}."));
                }
            }
        }

        self.pending = pending;
        Ok(Stage::Done(Outcome::Completed))
    }

    /// A failure here is reported and counted, never fatal to the run.
    async fn unfollow_one<G: FollowGraph>(&mut self, graph: &G, handle: &str) {
        self.console.say(&format!("Unfollowing {handle}..."));
        self.tally.attempted += 1;

        match graph.unfollow(handle).await {
            Ok(()) => {
                self.console
                    .say(&format!("Successfully unfollowed {handle}."));
                self.tally.unfollowed.push(handle.to_string());
            }
            Err(error) => {
                warn!("Failed to unfollow {}: {}", handle, error);
                self.console
                    .say(&format!("Could not unfollow {handle}: {error}"));
                self.tally.failed.push(handle.to_string());
            }
        }
    }

    fn finish(self, outcome: Outcome) -> RunReport {
        match &outcome {
            Outcome::MissingInput => {
                self.console.say("");
                self.console
                    .say("Username and token cannot be empty. Exiting.");
            }
            Outcome::FetchFailed { relation, error } => {
                error!("Fetching {} failed: {}", relation, error);
                self.console.say("");
                self.console.say(&format!("An error occurred: {error}"));
                self.console.say(error.user_hint());
                self.console.say(&format!(
                    "Could not retrieve the '{relation}' list. Exiting."
                ));
            }
            Outcome::FullyReciprocal => {
                self.console.say("");
                self.console
                    .say("Great news! Everyone you follow also follows you back.");
            }
            Outcome::Declined => {
                self.console.say("");
                self.console.say("No action taken. Exiting.");
            }
            Outcome::Completed | Outcome::Stopped { .. } => {
                self.console.say("");
                self.console.say(&format!(
                    "Process complete. Unfollowed {} user(s).",
                    self.tally.unfollowed_count()
                ));
                if !self.tally.failed.is_empty() {
                    self.console.say(&format!(
                        "Failed to unfollow: {}",
                        self.tally.failed.join(", ")
                    ));
                }
            }
        }

        RunReport {
            outcome,
            non_reciprocal: self.pending,
            tally: self.tally,
        }
    }
}
