//! End to end behavior of the client against a mocked API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use httpmock::prelude::*;
use isogeo_api::models::{Catalog, Contact, Keyword, Metadata, Workgroup};
use isogeo_api::{
    AuthError,
    BearerToken,
    CheckError,
    Created,
    Credentials,
    ExistenceCheck,
    Includes,
    IsogeoClient,
    IsogeoClientConfig,
    IsogeoClientError,
    Platform,
    TokenIssuer,
};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use url::Url;

const WG: &str = "32f7e95ec4e94ca3bc1afda960003882";
const ROADS_ID: &str = "d220a5fb5e8a4e6ea4bf5a3b5a4e9b57";

#[derive(Debug, Clone, Default)]
struct FakeIssuer {
    issued: Arc<AtomicUsize>,
}

impl TokenIssuer for FakeIssuer {
    async fn issue(&self, _credentials: &Credentials) -> Result<BearerToken, AuthError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(BearerToken {
            access_token: format!("token-{n}"),
            expires_at: Utc::now() + TimeDelta::hours(1),
        })
    }
}

fn client(server: &MockServer, issuer: FakeIssuer) -> IsogeoClient<FakeIssuer> {
    let mut config = IsogeoClientConfig::new(Platform::Qa, Credentials::ClientCredentials {
        client_id: "test-app".to_string(),
        client_secret: "secret".to_string(),
    });
    config.api_url = Some(Url::parse(&server.base_url()).unwrap());
    IsogeoClient::with_issuer(config, issuer).unwrap()
}

#[tokio::test]
async fn duplicate_catalog_names_are_detected_within_a_session() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/groups/{WG}/catalogs"));
            then.status(200).json_body(json!([
                {"_id": "0b7c4bc2b23f4c9e9ba8b0ad2c84a2b6", "name": "Rivers", "$scan": false}
            ]));
        })
        .await;
    let creation = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/groups/{WG}/catalogs"))
                .json_body(json!({"code": "roads", "name": "Roads", "$scan": false}));
            then.status(201).json_body(json!({
                "_id": ROADS_ID,
                "_created": "2019-05-17T13:56:56.6162418+00:00",
                "_abilities": ["catalog:delete", "catalog:edit"],
                "code": "roads",
                "name": "Roads",
                "owner": {"_id": WG},
                "$scan": false
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());
    let check = ExistenceCheck::try_from(1).unwrap();

    let roads = Catalog {
        code: Some("roads".to_string()),
        scan: Some(false),
        ..Catalog::new("Roads")
    };

    // empty cache: one listing, no match, created
    let first = client.create(WG, &roads, check).await.unwrap();
    let Created::New(created) = first else {
        panic!("expected Roads to be created");
    };
    assert_eq!(created.name.as_deref(), Some("Roads"));
    assert_eq!(created.id, Some(ROADS_ID.parse().unwrap()));
    listing.assert_hits_async(1).await;
    creation.assert_hits_async(1).await;

    // same name again: found in the cache, nothing sent
    let second = client.create(WG, &roads, check).await.unwrap();
    assert_eq!(second, Created::AlreadyExists {
        id: ROADS_ID.parse().unwrap()
    });
    listing.assert_hits_async(1).await;
    creation.assert_hits_async(1).await;

    // an existing catalog from the listing is found as well
    let rivers = client
        .create(WG, &Catalog::new("Rivers"), check)
        .await
        .unwrap();
    assert!(!rivers.is_new());
    listing.assert_hits_async(1).await;
}

#[tokio::test]
async fn skipping_the_existence_check_always_creates() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/groups/{WG}/catalogs"));
            then.status(200).json_body(json!([]));
        })
        .await;
    let creation = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/groups/{WG}/catalogs"));
            then.status(201)
                .json_body(json!({"_id": ROADS_ID, "name": "Roads"}));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    for _ in 0..2 {
        let outcome = client
            .create(WG, &Catalog::new("Roads"), ExistenceCheck::try_from(0).unwrap())
            .await
            .unwrap();
        assert!(outcome.is_new());
    }
    listing.assert_hits_async(0).await;
    creation.assert_hits_async(2).await;
}

#[tokio::test]
async fn contacts_are_unique_by_name_and_email() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/groups/{WG}/contacts"));
            then.status(200).json_body(json!([{
                "_id": "2a3aefc4f80347f590afe58127f6cb0f",
                "name": "Jane Doe",
                "email": "jane@example.com"
            }]));
        })
        .await;
    let creation = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/groups/{WG}/contacts"))
                .json_body_partial(r#"{"name": "Jane Doe", "email": "jane.doe@example.org", "phoneNumber": "01 02"}"#);
            then.status(201).json_body(json!({
                "_id": "7d2f2e3c9f4b4c4c8d3f9b3c2a1e0f11",
                "name": "Jane Doe",
                "email": "jane.doe@example.org",
                "phone": "01 02"
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let same = Contact {
        name: Some("Jane Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        ..Default::default()
    };
    assert_eq!(
        client
            .create(WG, &same, ExistenceCheck::Check)
            .await
            .unwrap(),
        Created::AlreadyExists {
            id: "2a3aefc4f80347f590afe58127f6cb0f".parse().unwrap()
        }
    );

    let homonym = Contact {
        email: Some("jane.doe@example.org".to_string()),
        phone: Some("01 02".to_string()),
        ..same
    };
    let outcome = client
        .create(WG, &homonym, ExistenceCheck::Check)
        .await
        .unwrap();
    assert!(outcome.is_new());
    creation.assert_async().await;
}

#[tokio::test]
async fn platform_identifiers_are_normalized_in_routes() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/resources/0269803d50c446b09f5060ef7fe3e22b")
                .query_param("_include", "contacts,links");
            then.status(200).json_body(json!({
                "_id": "0269803d50c446b09f5060ef7fe3e22b",
                "title": "Roads",
                "type": "vectorDataset"
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let md = client
        .metadata(
            "isogeo:metadata:0269803d50c446b09f5060ef7fe3e22b",
            &Includes::of(["contacts", "links"]),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(md.title_or_name(), Some("Roads"));
    assert_eq!(
        md.id.map(|id| id.to_string()).as_deref(),
        Some("0269803d50c446b09f5060ef7fe3e22b")
    );
}

#[tokio::test]
async fn not_found_is_a_structured_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/groups/{WG}/catalogs/{ROADS_ID}"));
            then.status(404).json_body(json!({"error": "not found"}));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let err = client
        .get::<Catalog>(Some(WG), ROADS_ID, &Includes::None)
        .await
        .unwrap_err();

    let IsogeoClientError::RemoteRejected(rejection) = err else {
        panic!("expected the API to reject the request");
    };
    assert_eq!(rejection.status, StatusCode::NOT_FOUND);
    assert_eq!(rejection.reason, "Not Found");
    assert_eq!(rejection.detail.as_deref(), Some("not found"));
    assert_eq!(
        Url::parse(&rejection.url).unwrap().path(),
        format!("/groups/{WG}/catalogs/{ROADS_ID}")
    );
}

#[tokio::test]
async fn one_token_serves_the_session() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/groups/{WG}/catalogs"))
                .header("authorization", "Bearer token-1");
            then.status(200).json_body(json!([]));
        })
        .await;
    let issuer = FakeIssuer::default();
    let client = client(&server, issuer.clone());

    client.connect().await.unwrap();
    for _ in 0..3 {
        client
            .list::<Catalog>(WG, &Includes::None, false)
            .await
            .unwrap();
    }

    mock.assert_hits_async(3).await;
    assert_eq!(issuer.issued.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn metadata_updates_go_to_the_resource_route() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/resources/0269803d50c446b09f5060ef7fe3e22b")
                .json_body_partial(r#"{"title": "Main roads"}"#);
            then.status(200).json_body(json!({
                "_id": "0269803d50c446b09f5060ef7fe3e22b",
                "title": "Main roads",
                "type": "vectorDataset"
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let md = Metadata {
        id: Some("0269803d50c446b09f5060ef7fe3e22b".parse().unwrap()),
        title: Some("Main roads".to_string()),
        ..Default::default()
    };
    let updated = client.update(&md, false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(updated.title.as_deref(), Some("Main roads"));

    let err = client
        .update(&Metadata::default(), false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IsogeoClientError::Check(CheckError::InvalidCombination(_))
    ));
}

#[tokio::test]
async fn keyword_existence_check_reads_every_listing_page() {
    const THESAURUS: &str = "1616597fbc4348c8b11ef9d59cf594c8";
    const ROADS_KEYWORD: &str = "6e2a3f1cbd9a4c5f8f04bb2f8b0a1c77";

    let server = MockServer::start_async().await;
    let first_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/thesauri/{THESAURUS}/keywords/search"))
                .query_param("_offset", "0");
            then.status(200).json_body(json!({
                "total": 2,
                "results": [{"_id": "0b7c4bc2b23f4c9e9ba8b0ad2c84a2b6", "$text": "rivers"}]
            }));
        })
        .await;
    let second_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/thesauri/{THESAURUS}/keywords/search"))
                .query_param("_offset", "1");
            then.status(200).json_body(json!({
                "total": 2,
                "results": [{"_id": ROADS_KEYWORD, "$text": "roads"}]
            }));
        })
        .await;
    let creation = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/thesauri/{THESAURUS}/keywords"));
            then.status(201).json_body(json!({"_id": ROADS_KEYWORD, "$text": "roads"}));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let created = client
        .create(THESAURUS, &Keyword::new("roads"), ExistenceCheck::Check)
        .await
        .unwrap();

    assert_eq!(created, Created::AlreadyExists {
        id: ROADS_KEYWORD.parse().unwrap()
    });
    first_page.assert_hits_async(1).await;
    second_page.assert_hits_async(1).await;
    creation.assert_hits_async(0).await;
}

#[tokio::test]
async fn metadata_listing_uses_the_workgroup_search() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/groups/{WG}/resources/search"))
                .query_param("_limit", "100")
                .query_param("_offset", "0");
            then.status(200).json_body(json!({
                "total": 1,
                "results": [{
                    "_id": "0269803d50c446b09f5060ef7fe3e22b",
                    "title": "Main roads",
                    "type": "vectorDataset"
                }]
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    let records = client
        .list::<Metadata>(WG, &Includes::None, true)
        .await
        .unwrap();

    listing.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Main roads"));

    let duplicate = Metadata {
        title: Some("Main roads".to_string()),
        ..Default::default()
    };
    let created = client
        .create(WG, &duplicate, ExistenceCheck::Check)
        .await
        .unwrap();
    assert_eq!(created, Created::AlreadyExists {
        id: "0269803d50c446b09f5060ef7fe3e22b".parse().unwrap()
    });
    listing.assert_hits_async(1).await;
}

#[tokio::test]
async fn renamed_catalogs_free_their_previous_name() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/groups/{WG}/catalogs"));
            then.status(200)
                .json_body(json!([{"_id": ROADS_ID, "name": "Roads", "$scan": false}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/groups/{WG}/catalogs/{ROADS_ID}"));
            then.status(200).json_body(json!({
                "_id": ROADS_ID,
                "name": "Highways",
                "owner": {"_id": WG},
                "$scan": false
            }));
        })
        .await;
    let creation = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/groups/{WG}/catalogs"));
            then.status(201).json_body(json!({
                "_id": "0b7c4bc2b23f4c9e9ba8b0ad2c84a2b6",
                "name": "Roads",
                "$scan": false
            }));
        })
        .await;
    let client = client(&server, FakeIssuer::default());

    client
        .list::<Catalog>(WG, &Includes::None, true)
        .await
        .unwrap();
    let renamed = Catalog {
        id: Some(ROADS_ID.parse().unwrap()),
        owner: Some(Workgroup {
            id: Some(WG.parse().unwrap()),
            ..Default::default()
        }),
        ..Catalog::new("Highways")
    };
    client.update(&renamed, true).await.unwrap();

    let again = client
        .create(WG, &Catalog::new("Highways"), ExistenceCheck::Check)
        .await
        .unwrap();
    assert_eq!(again, Created::AlreadyExists {
        id: ROADS_ID.parse().unwrap()
    });

    let roads = client
        .create(WG, &Catalog::new("Roads"), ExistenceCheck::Check)
        .await
        .unwrap();
    assert!(roads.is_new());
    creation.assert_hits_async(1).await;
}
