use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn first_upload_gets_rank_one() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                "report.pdf",
                "application/pdf",
                b"%PDF-1.4 fake".to_vec(),
                Some("Quarterly Report"),
                Some("Q3 numbers"),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"].as_str().unwrap(), "Quarterly Report");
        assert_eq!(res.body["slug"].as_str().unwrap(), "quarterly-report");
        assert_eq!(res.body["description"].as_str().unwrap(), "Q3 numbers");
        assert_eq!(res.body["order"].as_i64().unwrap(), 1);
        assert_eq!(res.body["fileName"].as_str().unwrap(), "report.pdf");
        assert_eq!(res.body["fileSize"].as_i64().unwrap(), 13);
        assert_eq!(res.body["mimeType"].as_str().unwrap(), "application/pdf");
        assert!(
            res.body["fileUrl"]
                .as_str()
                .unwrap()
                .starts_with("http://blobs.test/blobs/")
        );
        assert!(Uuid::parse_str(res.body["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn each_upload_gets_next_rank() {
        let app = TestApp::spawn().await;
        app.upload_titled("First").await;
        app.upload_titled("Second").await;

        let res = app
            .upload("c.txt", "text/plain", b"c".to_vec(), Some("Third"), None)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["order"].as_i64().unwrap(), 3);
    }

    #[tokio::test]
    async fn missing_description_defaults_to_empty() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("a.txt", "text/plain", b"a".to_vec(), Some("No Description"), None)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["description"].as_str().unwrap(), "");
    }

    #[tokio::test]
    async fn missing_file_field_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("title", "No File Here");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let res = crate::common::TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        assert_eq!(res.body["message"].as_str().unwrap(), "No file provided");
    }

    #[tokio::test]
    async fn disallowed_content_type_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                "archive.zip",
                "application/zip",
                b"PK".to_vec(),
                Some("Archive"),
                None,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"].as_str().unwrap(), "File type not allowed");

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn oversize_file_rejected() {
        let app = TestApp::spawn_with_max_file_size(1024).await;

        let res = app
            .upload(
                "big.txt",
                "text/plain",
                vec![b'x'; 2048],
                Some("Too Big"),
                None,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("too large"));
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn empty_title_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("a.txt", "text/plain", b"a".to_vec(), Some("   "), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"].as_str().unwrap(), "Title is required");
    }

    #[tokio::test]
    async fn missing_title_field_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("a.txt", "text/plain", b"a".to_vec(), None, None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"].as_str().unwrap(), "Title is required");
    }

    #[tokio::test]
    async fn sixth_upload_rejected_and_store_unchanged() {
        let app = TestApp::spawn().await;
        for i in 1..=5 {
            app.upload_titled(&format!("Document {i}")).await;
        }

        let res = app
            .upload("six.txt", "text/plain", b"6".to_vec(), Some("Document 6"), None)
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("limit"));

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 5);
        assert_eq!(app.blob_count(), 5);
    }

    #[tokio::test]
    async fn colliding_slug_rejected_as_conflict() {
        let app = TestApp::spawn().await;
        app.upload_titled("My File").await;

        let res = app
            .upload("b.txt", "text/plain", b"b".to_vec(), Some("My File!!"), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "CONFLICT");

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn files_come_back_sorted_by_rank() {
        let app = TestApp::spawn().await;
        app.upload_titled("Alpha").await;
        app.upload_titled("Beta").await;
        app.upload_titled("Gamma").await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        let files = res.body.as_array().unwrap();
        let titles: Vec<&str> = files
            .iter()
            .map(|f| f["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Alpha", "Beta", "Gamma"]);
        let orders: Vec<i64> = files.iter().map(|f| f["order"].as_i64().unwrap()).collect();
        assert_eq!(orders, [1, 2, 3]);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_and_blob() {
        let app = TestApp::spawn().await;
        let id = app.upload_titled("Ephemeral").await;
        assert_eq!(app.blob_count(), 1);

        let res = app.delete(&routes::file(&id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"].as_bool().unwrap(), true);
        assert_eq!(app.blob_count(), 0);

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn deleting_unknown_id_is_not_found() {
        let app = TestApp::spawn().await;
        app.upload_titled("Survivor").await;

        let res = app.delete(&routes::file(&Uuid::now_v7().to_string())).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::file("not-a-uuid")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }
}

mod reorder {
    use super::*;

    async fn current_ids(app: &TestApp) -> Vec<String> {
        app.get(routes::FILES)
            .await
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn permutation_is_applied_with_dense_ranks() {
        let app = TestApp::spawn().await;
        let a = app.upload_titled("A").await;
        let b = app.upload_titled("B").await;
        let c = app.upload_titled("C").await;

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": [c, a, b] }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"].as_bool().unwrap(), true);

        let list = app.get(routes::FILES).await;
        let files = list.body.as_array().unwrap();
        let titles: Vec<&str> = files
            .iter()
            .map(|f| f["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["C", "A", "B"]);
        let orders: Vec<i64> = files.iter().map(|f| f["order"].as_i64().unwrap()).collect();
        assert_eq!(orders, [1, 2, 3]);
    }

    #[tokio::test]
    async fn identity_permutation_changes_nothing() {
        let app = TestApp::spawn().await;
        app.upload_titled("One").await;
        app.upload_titled("Two").await;
        let before = current_ids(&app).await;

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": before }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);

        let list = app.get(routes::FILES).await;
        let orders: Vec<i64> = list
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["order"].as_i64().unwrap())
            .collect();
        assert_eq!(orders, [1, 2]);
        assert_eq!(current_ids(&app).await, current_ids(&app).await);
    }

    #[tokio::test]
    async fn unknown_id_fails_whole_batch() {
        let app = TestApp::spawn().await;
        app.upload_titled("Kept One").await;
        app.upload_titled("Kept Two").await;
        let mut ids = current_ids(&app).await;
        ids.push(Uuid::now_v7().to_string());

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": ids }))
            .await;

        assert_eq!(res.status, 404);

        // Pre-reorder ranks fully intact.
        let list = app.get(routes::FILES).await;
        let files = list.body.as_array().unwrap();
        let titles: Vec<&str> = files
            .iter()
            .map(|f| f["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Kept One", "Kept Two"]);
        let orders: Vec<i64> = files.iter().map(|f| f["order"].as_i64().unwrap()).collect();
        assert_eq!(orders, [1, 2]);
    }

    #[tokio::test]
    async fn partial_id_set_rejected() {
        let app = TestApp::spawn().await;
        let a = app.upload_titled("Whole").await;
        app.upload_titled("Missing").await;

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": [a] }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");

        let list = app.get(routes::FILES).await;
        let orders: Vec<i64> = list
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["order"].as_i64().unwrap())
            .collect();
        assert_eq!(orders, [1, 2]);
    }

    #[tokio::test]
    async fn empty_list_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": [] }))
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn duplicate_ids_rejected() {
        let app = TestApp::spawn().await;
        let a = app.upload_titled("Dup Target").await;

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": [a.clone(), a] }))
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn delete_then_reorder_remaining() {
        let app = TestApp::spawn().await;
        let a = app.upload_titled("Stays A").await;
        let b = app.upload_titled("Goes").await;
        let c = app.upload_titled("Stays C").await;

        let res = app.delete(&routes::file(&b)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .put_json(routes::REORDER, &json!({ "fileIds": [c, a] }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let list = app.get(routes::FILES).await;
        let files = list.body.as_array().unwrap();
        let titles: Vec<&str> = files
            .iter()
            .map(|f| f["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Stays C", "Stays A"]);
        let orders: Vec<i64> = files.iter().map(|f| f["order"].as_i64().unwrap()).collect();
        assert_eq!(orders, [1, 2]);
    }
}
