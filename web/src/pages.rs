//! Minimal inline HTML rendering. Deliberately template-engine-free; these
//! pages are a thin shell around the pipeline.

use axum::response::Html;

use pipeline::PipelineRun;
use prospector_core::ResultRecord;

use crate::quota::QuotaStatus;

/// HTML-escapes user- and model-provided text.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - Prospector</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; max-width: 880px; margin: 2rem auto; padding: 0 1rem; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 6px 10px; text-align: left; vertical-align: top; }}\n\
         .quota {{ color: #555; }}\n\
         .error {{ color: #a00; }}\n\
         nav a {{ margin-right: 1rem; }}\n\
         </style>\n</head>\n<body>\n\
         <nav><a href=\"/\">Scrape</a><a href=\"/verify\">Verify email</a>\
         <a href=\"/signin\">Sign in</a><a href=\"/logout\">Sign out</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
        body = body
    ))
}

fn quota_line(status: &QuotaStatus) -> String {
    let tier = if status.verified {
        "verified"
    } else {
        "anonymous"
    };
    format!(
        "<p class=\"quota\">Usage today: {}/{} ({})</p>",
        status.used, status.limit, tier
    )
}

pub fn index_page(
    status: &QuotaStatus,
    user: Option<&str>,
    recent: &[ResultRecord],
) -> Html<String> {
    let greeting = match user {
        Some(email) => format!("<p>Signed in as <strong>{}</strong>.</p>", escape(email)),
        None => "<p>Browsing anonymously. <a href=\"/verify\">Verify your email</a> \
                 to raise your daily limit.</p>"
            .to_string(),
    };

    let mut body = format!(
        "{greeting}{quota}\
         <form method=\"post\" action=\"/scrape\">\n\
         <p><label>Subreddits (comma or newline separated)<br>\
         <textarea name=\"subreddits\" rows=\"3\" cols=\"60\">consulting, smallbusiness</textarea>\
         </label></p>\n\
         <p><label>Posts per subreddit \
         <input type=\"number\" name=\"posts_per_subreddit\" value=\"5\" min=\"1\" max=\"15\"></label></p>\n\
         <p><label>Comments per post \
         <input type=\"number\" name=\"comments_per_post\" value=\"15\" min=\"0\" max=\"50\"></label></p>\n\
         <p><button type=\"submit\">Scrape now</button></p>\n\
         </form>\n",
        greeting = greeting,
        quota = quota_line(status)
    );

    if !recent.is_empty() {
        body.push_str("<h2>Recent ideas</h2>\n<table>\n<tr><th>Title</th><th>Problem</th><th>Solution</th></tr>\n");
        for record in recent {
            body.push_str(&format!(
                "<tr><td><a href=\"{url}\">{title}</a></td><td>{problem}</td><td>{solution}</td></tr>\n",
                url = escape(&record.reddit.url),
                title = escape(&record.reddit.title),
                problem = escape(&record.analysis.problem_description),
                solution = escape(&record.solution.solution_description),
            ));
        }
        body.push_str("</table>\n");
    }

    layout("Reddit SaaS Idea Finder", &body)
}

pub fn results_page(run: &PipelineRun, status: &QuotaStatus) -> Html<String> {
    let mut body = String::new();

    if run.records.is_empty() {
        body.push_str("<p>Nothing new this time - you're up to date!</p>\n");
    } else {
        body.push_str(&format!(
            "<p>Added {} new record(s)!</p>\n",
            run.records.len()
        ));
    }

    if !run.report.is_empty() {
        body.push_str("<h2>Scrape report</h2>\n<table>\n<tr><th>Title</th><th>Status</th><th>Details</th></tr>\n");
        for entry in &run.report {
            body.push_str(&format!(
                "<tr><td><a href=\"{url}\">{title}</a></td><td>{status}</td><td>{details}</td></tr>\n",
                url = escape(&entry.url),
                title = escape(&entry.title),
                status = entry.status,
                details = escape(&entry.details),
            ));
        }
        body.push_str("</table>\n");
    }

    for record in &run.records {
        body.push_str(&format!(
            "<h2>{title}</h2>\n<p><em>{problem}</em></p>\n<h3>Playbook</h3>\n<ol>\n",
            title = escape(&record.reddit.title),
            problem = escape(&record.analysis.problem_description),
        ));
        for prompt in &record.cursor_playbook {
            body.push_str(&format!("<li><pre>{}</pre></li>\n", escape(prompt)));
        }
        body.push_str("</ol>\n");
    }

    body.push_str(&quota_line(status));
    body.push_str("<p><a href=\"/\">Back to the scrape form</a></p>\n");
    layout("Scrape results", &body)
}

pub fn verify_page(message: Option<&str>) -> Html<String> {
    let notice = message
        .map(|m| format!("<p class=\"error\">{}</p>\n", escape(m)))
        .unwrap_or_default();
    let body = format!(
        "{notice}<p>Enter your email to receive a verification link. Verified \
         accounts get a higher daily scrape limit.</p>\n\
         <form method=\"post\" action=\"/verify\">\n\
         <p><input type=\"email\" name=\"email\" placeholder=\"you@example.com\" required>\n\
         <button type=\"submit\">Send verification link</button></p>\n\
         </form>\n"
    );
    layout("Verify your email", &body)
}

pub fn verification_sent_page(email: &str) -> Html<String> {
    layout(
        "Check your inbox",
        &format!(
            "<p>A verification link is on its way to <strong>{}</strong>. \
             It expires in 10 minutes.</p>",
            escape(email)
        ),
    )
}

pub fn manual_link_page(url: &str) -> Html<String> {
    layout(
        "Manual verification link",
        &format!(
            "<p>Email sending is not configured, so use this link directly:</p>\n\
             <p><a href=\"{url}\">Click to verify your email</a></p>\n\
             <p><code>{url}</code></p>\n\
             <p><strong>This link will expire in 10 minutes.</strong></p>",
            url = escape(url)
        ),
    )
}

pub fn verified_page(email: &str) -> Html<String> {
    layout(
        "Email verified",
        &format!(
            "<p>Email verified successfully! Welcome, <strong>{}</strong>.</p>\n\
             <p><a href=\"/\">Start scraping</a></p>",
            escape(email)
        ),
    )
}

pub fn signin_page(message: Option<&str>) -> Html<String> {
    let notice = message
        .map(|m| format!("<p class=\"error\">{}</p>\n", escape(m)))
        .unwrap_or_default();
    let body = format!(
        "{notice}<p>Sign in with an email you have already verified.</p>\n\
         <form method=\"post\" action=\"/signin\">\n\
         <p><input type=\"email\" name=\"email\" placeholder=\"you@example.com\" required>\n\
         <button type=\"submit\">Sign in</button></p>\n\
         </form>\n"
    );
    layout("Sign in", &body)
}

pub fn signed_in_page(email: &str) -> Html<String> {
    layout(
        "Signed in",
        &format!(
            "<p>Welcome back, <strong>{}</strong>.</p>\n<p><a href=\"/\">Start scraping</a></p>",
            escape(email)
        ),
    )
}

pub fn upgrade_thanks_page() -> Html<String> {
    layout(
        "Thanks",
        "<p>Noted! We'll reach out when higher limits are available.</p>\n\
         <p><a href=\"/\">Back</a></p>",
    )
}

pub fn error_page(message: &str) -> Html<String> {
    layout(
        "Something went wrong",
        &format!(
            "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
            escape(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert(\"x\") & more</script>"),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; more&lt;/script&gt;"
        );
    }

    #[test]
    fn error_page_escapes_the_message() {
        let Html(html) = error_page("<b>boom</b>");
        assert!(html.contains("&lt;b&gt;boom&lt;/b&gt;"));
        assert!(!html.contains("<b>boom</b>"));
    }
}
