use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use llm_interface::OpportunityModel;
use pipeline::{Ledger, Orchestrator, PostSource, ResultSink};
use prospector_core::{
    CoreError, Judgment, LlmError, Playbook, RedditApiError, RedditPost, ReportStatus,
    ResultRecord, Solution, Stage,
};

fn make_post(id: &str, subreddit: &str) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        subreddit: subreddit.to_string(),
        title: format!("Post {}", id),
        body: "Some pain point described at length".to_string(),
        url: format!("https://reddit.com/r/{}/comments/{}/", subreddit, id),
        comments: vec!["me too".to_string()],
    }
}

fn viable_judgment() -> Judgment {
    Judgment {
        is_viable: true,
        is_opportunity: Some(false),
        problem_description: "manual data entry".to_string(),
        opportunity_description: None,
        target_market: "freelancers".to_string(),
        confidence_score: 0.8,
    }
}

fn not_viable_judgment() -> Judgment {
    Judgment {
        is_viable: false,
        is_opportunity: Some(false),
        problem_description: "just a meme".to_string(),
        opportunity_description: None,
        target_market: String::new(),
        confidence_score: 0.2,
    }
}

fn some_solution() -> Solution {
    Solution {
        solution_description: "niche importer".to_string(),
        tech_stack: vec!["rust".to_string()],
        mvp_features: vec!["import".to_string(), "review".to_string()],
        est_development_time: "2 weeks".to_string(),
    }
}

fn some_playbook() -> Playbook {
    Playbook {
        prompts: vec!["Context prompt".to_string(), "Bootstrap".to_string()],
    }
}

/// Deterministic stand-in for the LLM stages. `Err` holds the malformed-JSON
/// details to surface.
struct ScriptedModel {
    judgment: Result<Judgment, &'static str>,
    solution: Result<Solution, &'static str>,
    playbook: Result<Playbook, &'static str>,
}

#[async_trait]
impl OpportunityModel for ScriptedModel {
    async fn judge(&self, _context: &str) -> Result<Judgment, CoreError> {
        match &self.judgment {
            Ok(judgment) => Ok(judgment.clone()),
            Err(details) => Err(CoreError::Llm(LlmError::MalformedResponse {
                stage: Stage::Judgment,
                details: details.to_string(),
            })),
        }
    }

    async fn propose(
        &self,
        _problem: &str,
        _market: &str,
        _context: &str,
    ) -> Result<Solution, CoreError> {
        match &self.solution {
            Ok(solution) => Ok(solution.clone()),
            Err(details) => Err(CoreError::Llm(LlmError::MalformedResponse {
                stage: Stage::Solution,
                details: details.to_string(),
            })),
        }
    }

    async fn playbook(
        &self,
        _problem: &str,
        _market: &str,
        _solution: &str,
    ) -> Result<Playbook, CoreError> {
        match &self.playbook {
            Ok(playbook) => Ok(playbook.clone()),
            Err(details) => Err(CoreError::Llm(LlmError::MalformedResponse {
                stage: Stage::Playbook,
                details: details.to_string(),
            })),
        }
    }
}

/// In-memory post source honoring the seen-set contract.
struct FakeSource {
    posts: Vec<RedditPost>,
    failing_subreddits: HashSet<String>,
}

#[async_trait]
impl PostSource for FakeSource {
    async fn fetch_new(
        &self,
        subreddit: &str,
        max_posts: usize,
        _max_comments: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<RedditPost>, CoreError> {
        if self.failing_subreddits.contains(subreddit) {
            return Err(CoreError::RedditApi(RedditApiError::ServerError {
                status_code: 500,
            }));
        }
        Ok(self
            .posts
            .iter()
            .filter(|post| post.subreddit == subreddit && !seen.contains(&post.id))
            .take(max_posts)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MemoryLedger {
    inner: Mutex<HashSet<String>>,
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn seen_post_ids(&self) -> Result<HashSet<String>, CoreError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    async fn mark_scraped(&self, post_id: &str) -> Result<(), CoreError> {
        self.inner.lock().unwrap().insert(post_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<ResultRecord>>,
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, record: &ResultRecord) -> Result<(), CoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct Harness {
    orchestrator: Orchestrator,
    ledger: Arc<MemoryLedger>,
    sink: Arc<MemorySink>,
}

fn harness(source: FakeSource, model: ScriptedModel) -> Harness {
    let ledger = Arc::new(MemoryLedger::default());
    let sink = Arc::new(MemorySink::default());
    let orchestrator = Orchestrator::new(
        Arc::new(source),
        Arc::new(model),
        ledger.clone(),
        sink.clone(),
        Duration::from_millis(1),
        1200,
    );
    Harness {
        orchestrator,
        ledger,
        sink,
    }
}

#[tokio::test]
async fn scenario_not_viable_yields_report_only() {
    let h = harness(
        FakeSource {
            posts: vec![make_post("p1", "test")],
            failing_subreddits: HashSet::new(),
        },
        ScriptedModel {
            judgment: Ok(not_viable_judgment()),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let run = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();

    assert!(run.records.is_empty());
    assert_eq!(run.report.len(), 1);
    assert_eq!(run.report[0].status, ReportStatus::NotViable);
    assert_eq!(run.report[0].details, "just a meme");
    assert!(h.sink.records.lock().unwrap().is_empty());
    // Non-viable posts are not ledgered; they stay eligible for future runs.
    assert!(h.ledger.inner.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_full_success_yields_one_record() {
    let h = harness(
        FakeSource {
            posts: vec![make_post("p1", "test")],
            failing_subreddits: HashSet::new(),
        },
        ScriptedModel {
            judgment: Ok(viable_judgment()),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let run = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.report.len(), 1);
    assert_eq!(run.report[0].status, ReportStatus::Added);
    assert!(!run.records[0].cursor_playbook.is_empty());
    assert_eq!(run.records[0].reddit.id, "p1");

    // The record reached the sink and the post was ledgered.
    assert_eq!(h.sink.records.lock().unwrap().len(), 1);
    assert!(h.ledger.inner.lock().unwrap().contains("p1"));
}

#[tokio::test]
async fn scenario_malformed_judgment_yields_error_report() {
    let h = harness(
        FakeSource {
            posts: vec![make_post("p1", "test")],
            failing_subreddits: HashSet::new(),
        },
        ScriptedModel {
            judgment: Err("expected value at line 1 column 1"),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let run = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();

    assert!(run.records.is_empty());
    assert_eq!(run.report.len(), 1);
    assert_eq!(run.report[0].status, ReportStatus::Error);
    assert!(run.report[0].details.contains("judgment stage"));
    assert!(run.report[0].details.contains("expected value at line 1"));
}

#[tokio::test]
async fn solution_failure_aborts_the_post_not_the_run() {
    let h = harness(
        FakeSource {
            posts: vec![make_post("p1", "test"), make_post("p2", "test")],
            failing_subreddits: HashSet::new(),
        },
        ScriptedModel {
            judgment: Ok(viable_judgment()),
            solution: Err("truncated body"),
            playbook: Ok(some_playbook()),
        },
    );

    let run = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();

    assert!(run.records.is_empty());
    assert_eq!(run.report.len(), 2);
    for report in &run.report {
        assert_eq!(report.status, ReportStatus::Error);
        assert!(report.details.contains("solution stage"));
    }
}

#[tokio::test]
async fn ledgered_posts_are_never_reprocessed() {
    let source = FakeSource {
        posts: vec![make_post("p1", "test")],
        failing_subreddits: HashSet::new(),
    };
    let h = harness(
        source,
        ScriptedModel {
            judgment: Ok(viable_judgment()),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let first = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();
    assert_eq!(first.records.len(), 1);

    let second = h
        .orchestrator
        .run(&["test".to_string()], 3, 10)
        .await
        .unwrap();
    assert!(second.records.is_empty());
    assert!(second.report.is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_only_that_subreddit() {
    let mut failing = HashSet::new();
    failing.insert("down".to_string());

    let h = harness(
        FakeSource {
            posts: vec![make_post("p1", "up")],
            failing_subreddits: failing,
        },
        ScriptedModel {
            judgment: Ok(viable_judgment()),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let run = h
        .orchestrator
        .run(&["down".to_string(), "up".to_string()], 3, 10)
        .await
        .unwrap();

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].reddit.subreddit, "up");
}

#[tokio::test]
async fn run_single_records_a_viable_post() {
    let h = harness(
        FakeSource {
            posts: vec![],
            failing_subreddits: HashSet::new(),
        },
        ScriptedModel {
            judgment: Ok(viable_judgment()),
            solution: Ok(some_solution()),
            playbook: Ok(some_playbook()),
        },
    );

    let post = make_post("solo", "anything");
    let (report, record) = h.orchestrator.run_single(&post).await.unwrap();

    assert_eq!(report.status, ReportStatus::Added);
    assert!(record.is_some());
    assert!(h.ledger.inner.lock().unwrap().contains("solo"));
    assert_eq!(h.sink.records.lock().unwrap().len(), 1);
}
