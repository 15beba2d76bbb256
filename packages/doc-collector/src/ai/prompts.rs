//! Prompt templates for extraction and source discovery.

use crate::traits::ai::ModelRequest;
use crate::types::Source;

const EXTRACTION_SYSTEM: &str = "You identify official economic and regulatory publications \
on government and international-organization web pages. Reply with a JSON array only, \
no prose.";

const DISCOVERY_SYSTEM: &str = "You are an expert at locating public economic data published \
by governments and international bodies worldwide. Reply with a JSON array only, no prose.";

/// How many existing URLs are quoted back to the model as examples.
const DISCOVERY_URL_EXAMPLES: usize = 5;

/// Build the request asking for documents listed on one page.
pub fn extraction_request(url: &str, page_snippet: &str, max_documents: usize) -> ModelRequest {
    let prompt = format!(
        "Page URL: {url}\n\n\
         List at most {max_documents} recent publications (reports, statistics, budgets, \
         policy statements, regulatory notices) linked from the page content below.\n\
         Use absolute URLs. Dates must be YYYY-MM-DD; omit the field if unknown.\n\
         Output format:\n\
         [{{\"title\": \"...\", \"date\": \"YYYY-MM-DD\", \"url\": \"https://...\", \"category\": \"...\"}}]\n\n\
         Page content:\n{page_snippet}"
    );
    ModelRequest::new(EXTRACTION_SYSTEM, prompt)
}

/// Build the request asking for new sources outside the current registry.
pub fn discovery_request(existing: &[Source], max_new: usize) -> ModelRequest {
    let orgs: Vec<&str> = existing.iter().map(|s| s.org.as_str()).collect();
    let urls: Vec<&str> = existing
        .iter()
        .take(DISCOVERY_URL_EXAMPLES)
        .map(|s| s.url.as_str())
        .collect();

    let prompt = format!(
        "There are more than 190 countries and many international organizations.\n\
         These organizations are already collected: {orgs}.\n\n\
         Identify {max_new} NEW official URLs of finance ministries or central banks outside \
         that list (in particular South America, Central Asia, the Middle East, Africa and \
         the Pacific) that publish recent economic reports or statistics.\n\
         Rules:\n\
         1. Never include URLs already listed ({urls}...).\n\
         2. Each URL must point directly at a publications or reports page.\n\
         3. Output this JSON array format:\n\
         [{{\"id\": \"unique_id\", \"country\": \"ISO3\", \"org\": \"short name\", \
         \"url\": \"https://...\", \"category\": \"Economic\"}}]",
        orgs = orgs.join(", "),
        urls = urls.join(", "),
    );
    ModelRequest::new(DISCOVERY_SYSTEM, prompt).with_web_search()
}
