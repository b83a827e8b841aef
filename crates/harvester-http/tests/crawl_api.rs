use harvester_core::PartialRecord;
use harvester_http::{parse_response, CrawlApiConfig, HttpCrawler};

fn configured(endpoint: &str) -> CrawlApiConfig {
    CrawlApiConfig {
        endpoint: endpoint.into(),
        api_key: Some("fc-test".into()),
        timeout: 1,
        ..CrawlApiConfig::default()
    }
}

#[test]
fn successful_responses_become_partial_records() {
    let body = r#"{
        "success": true,
        "data": {"email": "info@sushipalace.de", "owner": "Takashi Yamamoto", "markdown": "..."}
    }"#;

    let record = parse_response(body).unwrap();

    assert_eq!(
        PartialRecord {
            email: Some("info@sushipalace.de".into()),
            phone: None,
            owner: Some("Takashi Yamamoto".into()),
        },
        record
    );
}

#[test]
fn success_without_data_is_empty() {
    let record = parse_response(r#"{"success": true}"#).unwrap();
    assert!(record.is_empty());
}

#[test]
fn failures_carry_the_api_message() {
    let err = parse_response(r#"{"success": false, "error": "Invalid API key"}"#).unwrap_err();
    assert_eq!("Invalid API key", err.to_string());

    let err = parse_response(r#"{"success": false}"#).unwrap_err();
    assert_eq!("Crawl API reported a failure", err.to_string());

    assert!(parse_response("<html>Bad gateway</html>").is_err());
}

#[test]
fn a_key_is_required() {
    assert!(HttpCrawler::new(CrawlApiConfig::default()).is_err());
    assert!(HttpCrawler::new(CrawlApiConfig {
        api_key: Some("  ".into()),
        ..CrawlApiConfig::default()
    })
    .is_err());
    assert!(!CrawlApiConfig::default().is_configured());
}

#[test]
fn scrape_url_joins_the_endpoint() {
    let crawler = HttpCrawler::new(configured("https://crawl.example.org/")).unwrap();
    assert_eq!("https://crawl.example.org/v1/scrape", crawler.scrape_url());
}

#[tokio::test]
async fn unreachable_api_rejects_the_key() {
    let crawler = HttpCrawler::new(configured("http://127.0.0.1:9")).unwrap();
    assert!(!crawler.test_api_key().await);
}
