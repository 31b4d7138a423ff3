use super::*;

#[test]
fn parses_analyze_with_multiple_inputs() {
    let cli = Cli::try_parse_from([
        "botscope",
        "analyze",
        "alice",
        "https://www.reddit.com/user/bob_1/",
        "--force",
        "--max-items",
        "50",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Analyze {
            inputs,
            force,
            max_items,
            json,
        } => {
            assert_eq!(inputs, ["alice", "https://www.reddit.com/user/bob_1/"]);
            assert!(force);
            assert_eq!(max_items, Some(50));
            assert!(!json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn analyze_requires_an_input() {
    assert!(Cli::try_parse_from(["botscope", "analyze"]).is_err());
}

#[test]
fn history_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["botscope", "history", "alice"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::History { ref username, limit: 10 } if username == "alice"
    ));
}

#[test]
fn parses_report_as_json() {
    let cli =
        Cli::try_parse_from(["botscope", "report", "42", "--json"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Report {
            snapshot_id: 42,
            json: true
        }
    ));
}

#[test]
fn report_rejects_non_numeric_id() {
    assert!(Cli::try_parse_from(["botscope", "report", "latest"]).is_err());
}

#[test]
fn parses_maintenance_commands() {
    let migrate = Cli::try_parse_from(["botscope", "migrate"]).expect("expected valid cli args");
    assert!(matches!(migrate.command, Commands::Migrate));

    let check =
        Cli::try_parse_from(["botscope", "check-credentials"]).expect("expected valid cli args");
    assert!(matches!(check.command, Commands::CheckCredentials));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["botscope"]).is_err());
}

mod render {
    use botscope_core::{
        ContentFeatures, CoverageFlags, Explanations, FeatureSet, InteractionFeatures, Reason,
        RepetitionFeatures, ScoreResult, TimingFeatures,
    };
    use botscope_db::{AnalysisReport, SnapshotRow};

    use crate::query::render_report;

    fn report(reasons: Vec<Reason>, has_items: bool) -> AnalysisReport {
        let coverage = CoverageFlags {
            has_items,
            has_timestamps: has_items,
            has_comments: has_items,
            has_posts: false,
        };
        AnalysisReport {
            snapshot: SnapshotRow {
                id: 7,
                account_id: 1,
                username: "alice".to_string(),
                collected_at: "2024-06-01T12:00:00Z".parse().unwrap(),
                post_count: 0,
                comment_count: 10,
                data_coverage_days: 3.04,
                collector_version: "v-test".to_string(),
            },
            items: Vec::new(),
            features: FeatureSet {
                timing: TimingFeatures {
                    posts_per_day: 0.0,
                    comments_per_day: 0.0,
                    active_hours_histogram: [0; 24],
                    sleep_gap_hours_p95: 0.0,
                    burstiness_index: 0.0,
                    regularity_score: 0.0,
                    span_days: 3.04,
                    total_items: 10,
                    timestamp_completeness: 1.0,
                },
                repetition: RepetitionFeatures {
                    near_duplicate_rate: 0.8,
                    top_phrase_reuse: 0.0,
                    link_domain_concentration: 0.0,
                    top_domain: None,
                    subreddit_entropy: 0.0,
                },
                content: ContentFeatures {
                    avg_comment_length: 0.0,
                    median_comment_length: 0.0,
                    url_rate: 0.0,
                },
                interaction: InteractionFeatures {
                    unique_threads_replied_to: 1,
                    top_level_reply_rate: 1.0,
                },
                coverage_flags: coverage,
            },
            score: ScoreResult {
                automation_score: 30,
                coordination_score: Some(26),
                confidence: Some(0.3),
                reasons,
                explanations: Explanations {
                    coverage,
                    confidence: 0.3,
                },
            },
        }
    }

    #[test]
    fn text_report_lists_reasons_with_evidence() {
        let text = render_report(&report(
            vec![Reason {
                title: "High near-duplicate rate".to_string(),
                impact: 30,
                evidence: vec!["https://www.reddit.com/r/rust/comments/abc/_/x/".to_string()],
                details: "Duplicate rate 0.80.".to_string(),
            }],
            true,
        ));

        assert!(text.starts_with("u/alice  snapshot 7  collected 2024-06-01 12:00 UTC\n"));
        assert!(text.contains("automation 30/100  coordination 26/100  confidence 0.30"));
        assert!(text.contains("0 posts, 10 comments over 3.0 days"));
        assert!(text.contains("[+30] High near-duplicate rate: Duplicate rate 0.80."));
        assert!(text.contains("        https://www.reddit.com/r/rust/comments/abc/_/x/"));
    }

    #[test]
    fn text_report_notes_missing_activity() {
        let text = render_report(&report(Vec::new(), false));
        assert!(text.contains("no automation signals fired"));
        assert!(text.contains("note: no public activity was found"));
    }
}
