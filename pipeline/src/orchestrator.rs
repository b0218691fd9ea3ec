use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use llm_interface::{problem_statement, OpportunityModel};
use prospector_core::{
    excerpt, CoreError, PostReport, RedditPost, ReportStatus, ResultRecord,
    CONTEXT_COMMENT_LIMIT,
};

use crate::gate::FixedIntervalGate;
use crate::seams::{Ledger, PostSource, ResultSink};

/// Output of one pipeline run: the records that made it all the way through,
/// and one report entry per examined post.
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub records: Vec<ResultRecord>,
    pub report: Vec<PostReport>,
}

/// Sequences Fetch -> Judge -> Solve -> Playbook -> Record, one subreddit and
/// one post at a time. No stage error is fatal to the run.
pub struct Orchestrator {
    source: Arc<dyn PostSource>,
    model: Arc<dyn OpportunityModel>,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn ResultSink>,
    gate: FixedIntervalGate,
    context_char_budget: usize,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn PostSource>,
        model: Arc<dyn OpportunityModel>,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn ResultSink>,
        stage_interval: Duration,
        context_char_budget: usize,
    ) -> Self {
        Self {
            source,
            model,
            ledger,
            sink,
            gate: FixedIntervalGate::new(stage_interval),
            context_char_budget,
        }
    }

    pub async fn run(
        &self,
        subreddits: &[String],
        posts_per_subreddit: usize,
        comments_per_post: usize,
    ) -> Result<PipelineRun, CoreError> {
        let mut seen = self.ledger.seen_post_ids().await?;
        let mut run = PipelineRun::default();

        for subreddit in subreddits {
            info!("Scraping r/{}", subreddit);
            let posts = match self
                .source
                .fetch_new(subreddit, posts_per_subreddit, comments_per_post, &seen)
                .await
            {
                Ok(posts) => posts,
                Err(e) => {
                    // A platform failure aborts this subreddit only.
                    warn!("Fetch failed for r/{}: {}", subreddit, e);
                    continue;
                }
            };

            if posts.is_empty() {
                info!("Nothing new in r/{}", subreddit);
                continue;
            }

            for post in posts {
                seen.insert(post.id.clone());
                let (report, record) = self.process_post(&post).await;
                if let Some(record) = record {
                    self.ledger.mark_scraped(&post.id).await?;
                    self.sink.append(&record).await?;
                    run.records.push(record);
                }
                run.report.push(report);
            }
        }

        Ok(run)
    }

    /// Full pipeline pass over a single already-fetched post (analyze-URL).
    pub async fn run_single(
        &self,
        post: &RedditPost,
    ) -> Result<(PostReport, Option<ResultRecord>), CoreError> {
        let (report, record) = self.process_post(post).await;
        if let Some(record) = &record {
            self.ledger.mark_scraped(&post.id).await?;
            self.sink.append(record).await?;
        }
        Ok((report, record))
    }

    async fn process_post(&self, post: &RedditPost) -> (PostReport, Option<ResultRecord>) {
        let context = post.context_text(CONTEXT_COMMENT_LIMIT, self.context_char_budget);
        let mut report = PostReport {
            title: post.title.clone(),
            url: post.url.clone(),
            status: ReportStatus::Error,
            details: String::new(),
        };

        self.gate.pace().await;
        let judgment = match self.model.judge(&context).await {
            Ok(judgment) => judgment,
            Err(e) => {
                warn!("Judgment failed for '{}': {}", excerpt(&post.title), e);
                report.details = format!("judgment stage: {}", e);
                return (report, None);
            }
        };

        if !judgment.is_viable {
            info!("Not viable: {}", excerpt(&post.title));
            report.status = ReportStatus::NotViable;
            report.details = judgment.problem_description.clone();
            return (report, None);
        }

        let problem = problem_statement(&judgment);

        self.gate.pace().await;
        let solution = match self
            .model
            .propose(&problem, &judgment.target_market, &context)
            .await
        {
            Ok(solution) => solution,
            Err(e) => {
                warn!("Solution failed for '{}': {}", excerpt(&post.title), e);
                report.details = format!("solution stage: {}", e);
                return (report, None);
            }
        };

        self.gate.pace().await;
        let playbook = match self
            .model
            .playbook(&problem, &judgment.target_market, &solution.solution_description)
            .await
        {
            Ok(playbook) => playbook,
            Err(e) => {
                warn!("Playbook failed for '{}': {}", excerpt(&post.title), e);
                report.details = format!("playbook stage: {}", e);
                return (report, None);
            }
        };

        info!("Added: {}", excerpt(&post.title));
        report.status = ReportStatus::Added;
        report.details = judgment.problem_description.clone();
        let record = ResultRecord::assemble(post, judgment, solution, playbook);
        (report, Some(record))
    }
}
