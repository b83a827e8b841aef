mod common;

use std::sync::Arc;

use harvester_core::{
    is_company_owner, BusinessId, BusinessRecord, Category, Enricher, FixtureCrawler,
    FixtureStore, HarvesterConfig, PartialRecord, SlugWebsiteFinder, Stop,
};

use common::{
    record, sample_harvester, sample_record, FailingCrawler, NoWebsiteFinder, ScriptedCrawler,
};

fn enricher(crawler: Arc<dyn harvester_core::Crawl>, config: &HarvesterConfig) -> Enricher {
    Enricher::new(
        FixtureStore::shared(),
        crawler,
        Arc::new(SlugWebsiteFinder::new(0)),
        config,
    )
}

#[tokio::test]
async fn unknown_id_is_absent() {
    let harvester = sample_harvester(Arc::new(FixtureCrawler::new(FixtureStore::shared())));

    let found = harvester
        .extract_business_data(BusinessId::new(), &Stop::never())
        .await
        .unwrap();

    assert_eq!(None, found);
}

#[tokio::test]
async fn extraction_is_idempotent_with_a_deterministic_crawler() {
    let harvester = sample_harvester(Arc::new(FixtureCrawler::new(FixtureStore::shared())));
    let stop = Stop::never();

    for fixture in FixtureStore::shared().iter() {
        let first = harvester
            .extract_business_data(fixture.id, &stop)
            .await
            .unwrap();
        let second = harvester
            .extract_business_data(fixture.id, &stop)
            .await
            .unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn company_owners_are_dropped() {
    let harvester = sample_harvester(Arc::new(FixtureCrawler::new(FixtureStore::shared())));
    let grand = sample_record("Grand Hotel Berlin");

    let enriched = harvester
        .extract_business_data(grand.id, &Stop::never())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(None, enriched.owner);
    assert_eq!(grand.email, enriched.email);
    // Stored copy is untouched
    assert_eq!(
        Some("Berlin Hospitality GmbH"),
        FixtureStore::shared()
            .get(grand.id)
            .and_then(|r| r.owner.as_deref())
    );
}

#[tokio::test]
async fn crawled_company_owners_are_dropped_in_any_casing() {
    let stop = Stop::never();
    for owner in ["Muster GmbH", "muster gmbh", "MUSTER GMBH", "Gmbh & Co. KG"] {
        let crawler = Arc::new(ScriptedCrawler::new(PartialRecord {
            owner: Some(owner.to_string()),
            ..PartialRecord::default()
        }));
        let enricher = enricher(crawler, &HarvesterConfig::instant());

        let enriched = enricher
            .enrich_record(&sample_record("Sushi Palace"), &stop)
            .await
            .unwrap();

        assert!(is_company_owner(owner));
        assert_eq!(None, enriched.owner, "{owner}");
    }
}

#[tokio::test]
async fn crawled_fields_take_precedence_only_when_returned() {
    let crawler = Arc::new(ScriptedCrawler::new(PartialRecord {
        email: Some("neu@sushipalace.de".into()),
        phone: Some("  ".into()),
        owner: None,
    }));
    let enricher = enricher(crawler.clone(), &HarvesterConfig::instant());
    let sushi = sample_record("Sushi Palace");

    let enriched = enricher
        .enrich_record(&sushi, &Stop::never())
        .await
        .unwrap();

    assert_eq!(vec!["https://sushipalace.de".to_string()], crawler.crawled());
    assert_eq!(Some("neu@sushipalace.de"), enriched.email.as_deref());
    assert_eq!(sushi.phone, enriched.phone);
    assert_eq!(sushi.owner, enriched.owner);
    assert_eq!(sushi.id, enriched.id);
}

#[tokio::test]
async fn crawl_failure_keeps_the_record() {
    let enricher = enricher(Arc::new(FailingCrawler), &HarvesterConfig::instant());
    let curry = sample_record("Curry 36");

    let enriched = enricher
        .enrich_record(&curry, &Stop::never())
        .await
        .unwrap();

    assert_eq!(curry, enriched);
}

#[tokio::test]
async fn missing_url_is_discovered_then_crawled() {
    let crawler = Arc::new(ScriptedCrawler::new(PartialRecord {
        phone: Some("+49 30 1111111".into()),
        ..PartialRecord::default()
    }));
    let enricher = enricher(crawler.clone(), &HarvesterConfig::instant());
    let bistro = record("Golden Bistro", Category::Restaurant, "10115");

    let enriched = enricher
        .enrich_record(&bistro, &Stop::never())
        .await
        .unwrap();

    assert_eq!(vec!["https://golden-bistro.de".to_string()], crawler.crawled());
    assert_eq!(Some("https://golden-bistro.de"), enriched.url.as_deref());
    assert_eq!(Some("+49 30 1111111"), enriched.phone.as_deref());
    assert_eq!(None, bistro.url);
}

#[tokio::test]
async fn no_website_found_means_no_crawl() {
    let crawler = Arc::new(ScriptedCrawler::new(PartialRecord::default()));
    let enricher = Enricher::new(
        FixtureStore::shared(),
        crawler.clone(),
        Arc::new(NoWebsiteFinder),
        &HarvesterConfig::instant(),
    );
    let inn = record("Royal Inn", Category::Hotel, "10785");

    let enriched = enricher.enrich_record(&inn, &Stop::never()).await.unwrap();

    assert!(crawler.crawled().is_empty());
    assert_eq!(inn, enriched);
}

#[tokio::test]
async fn unlisted_records_are_skipped_unless_enabled() {
    let crawler = Arc::new(ScriptedCrawler::new(PartialRecord {
        email: Some("hallo@golden-bistro.de".into()),
        ..PartialRecord::default()
    }));
    let bistro: BusinessRecord = record("Golden Bistro", Category::Restaurant, "10115");
    let stop = Stop::never();

    let strict = enricher(crawler.clone(), &HarvesterConfig::instant());
    assert_eq!(None, strict.extract(&bistro, &stop).await.unwrap());

    let lenient = enricher(
        crawler,
        &HarvesterConfig {
            enrich_unlisted: true,
            ..HarvesterConfig::instant()
        },
    );
    let enriched = lenient.extract(&bistro, &stop).await.unwrap().unwrap();
    assert_eq!(Some("hallo@golden-bistro.de"), enriched.email.as_deref());
}

#[tokio::test]
async fn extraction_honours_stop() {
    let harvester = sample_harvester(Arc::new(FixtureCrawler::new(FixtureStore::shared())));
    let (handle, stop) = harvester_core::stop_pair();
    handle.stop();

    let err = harvester
        .extract_business_data(sample_record("Viet Village").id, &stop)
        .await
        .unwrap_err();

    assert!(harvester_core::is_cancelled(&err));
}
