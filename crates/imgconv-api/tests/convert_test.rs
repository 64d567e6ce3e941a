//! Conversion API integration tests.
//!
//! Run with: `cargo test -p imgconv-api --test convert_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::fixtures::{
    create_test_gif, create_test_jpeg, create_test_png, create_text_file, decode_data_url,
};
use helpers::{conversion_form, default_server, partial_server, setup_test_server, CONVERT_PATH};
use imgconv_core::Config;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let server = default_server();
    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!({ "status": "alive" }));
}

#[tokio::test]
async fn test_list_formats_in_registry_order() {
    let server = default_server();
    let response = server.get("/api/formats").await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let ids: Vec<&str> = body["formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["png", "jpeg", "webp", "avif", "tiff", "gif"]);
    assert_eq!(
        body["formats"][1],
        json!({ "id": "jpeg", "mime": "image/jpeg", "extension": "jpg" })
    );
}

#[tokio::test]
async fn test_missing_format() {
    let server = default_server();
    let form = MultipartForm::new().add_part(
        "files",
        helpers::file_part("a.png", create_test_png(4, 4)),
    );

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Missing or invalid 'format'" })
    );
}

#[tokio::test]
async fn test_unsupported_format() {
    let server = default_server();
    let form = conversion_form("bmp", vec![("a.png", create_test_png(4, 4))]);

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Unsupported format. Supported formats: png, jpeg, webp, avif, tiff, gif" })
    );
}

#[tokio::test]
async fn test_unsupported_format_checked_before_files() {
    let server = default_server();
    let form = MultipartForm::new().add_text("format", "bmp");

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported format."));
}

#[tokio::test]
async fn test_no_files_uploaded() {
    let server = default_server();
    let form = MultipartForm::new()
        .add_text("format", "png")
        .add_text("comment", "ignored field");

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "No files uploaded under field 'files'" })
    );
}

#[tokio::test]
async fn test_non_multipart_body() {
    let server = default_server();
    let response = server
        .post(CONVERT_PATH)
        .json(&json!({ "format": "png" }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Invalid multipart body" })
    );
}

#[tokio::test]
async fn test_png_to_jpeg_naming_and_payload() {
    let server = default_server();
    let form = conversion_form("jpeg", vec![("photo.PNG", create_test_png(20, 10))]);

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);

    let file = &files[0];
    assert_eq!(file["name"], "photo.jpg");
    assert_eq!(file["mime"], "image/jpeg");

    let (mime, bytes) = decode_data_url(file["dataUrl"].as_str().unwrap());
    assert_eq!(mime, "image/jpeg");
    assert_eq!(file["size"].as_u64().unwrap() as usize, bytes.len());

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (20, 10));
}

#[tokio::test]
async fn test_batch_keeps_upload_order() {
    let server = default_server();
    let form = conversion_form(
        "png",
        vec![
            ("big.jpg", create_test_jpeg(400, 300)),
            ("small.gif", create_test_gif(3, 3)),
            ("medium.png", create_test_png(64, 48)),
            ("tiny.png", create_test_png(1, 1)),
        ],
    );

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let files = body["files"].as_array().unwrap();
    let names: Vec<&str> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["big.png", "small.png", "medium.png", "tiny.png"]);

    let expected_dimensions = [(400, 300), (3, 3), (64, 48), (1, 1)];
    for (file, expected) in files.iter().zip(expected_dimensions) {
        let (_, bytes) = decode_data_url(file["dataUrl"].as_str().unwrap());
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), expected);
    }
}

#[tokio::test]
async fn test_every_target_format() {
    let server = default_server();

    for (id, mime, extension) in [
        ("png", "image/png", "png"),
        ("jpeg", "image/jpeg", "jpg"),
        ("webp", "image/webp", "webp"),
        ("avif", "image/avif", "avif"),
        ("tiff", "image/tiff", "tiff"),
        ("gif", "image/gif", "gif"),
    ] {
        let form = conversion_form(id, vec![("sample.png", create_test_png(16, 12))]);
        let response = server.post(CONVERT_PATH).multipart(form).await;

        assert_eq!(response.status_code(), 200, "format {}", id);
        let body = response.json::<Value>();
        let file = &body["files"][0];
        assert_eq!(file["name"], format!("sample.{}", extension));
        assert_eq!(file["mime"], mime);
        assert!(file["size"].as_u64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_corrupt_input_returns_generic_error() {
    let server = default_server();
    let form = conversion_form(
        "webp",
        vec![
            ("good.png", create_test_png(8, 8)),
            ("private-notes.txt", create_text_file()),
        ],
    );

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 500);
    let text = response.text();
    assert_eq!(
        serde_json::from_str::<Value>(&text).unwrap(),
        json!({ "error": "Failed to convert images" })
    );
    assert!(!text.contains("private-notes"));
    assert!(!text.contains("SECRET-CONTENT"));
}

#[tokio::test]
async fn test_partial_policy_reports_failures_in_place() {
    let server = partial_server();
    let form = conversion_form(
        "gif",
        vec![
            ("first.png", create_test_png(5, 5)),
            ("broken.png", create_text_file()),
            ("third.jpg", create_test_jpeg(6, 6)),
        ],
    );

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["name"], "first.gif");
    assert_eq!(
        files[1],
        json!({ "name": "broken.png", "error": "Unsupported source encoding" })
    );
    assert_eq!(files[2]["name"], "third.gif");
}

#[tokio::test]
async fn test_text_files_field_is_not_a_file() {
    let server = default_server();
    let form = MultipartForm::new()
        .add_text("format", "png")
        .add_text("files", "hello");

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "No files uploaded under field 'files'" })
    );
}

#[tokio::test]
async fn test_format_must_be_a_single_text_field() {
    let server = default_server();
    let png = create_test_png(4, 4);

    let as_file = MultipartForm::new()
        .add_part("format", Part::text("png").file_name("format.txt"))
        .add_part("files", helpers::file_part("a.png", png.clone()));
    let not_utf8 = MultipartForm::new()
        .add_part("format", Part::bytes(vec![0xff, 0xfe, 0x70]))
        .add_part("files", helpers::file_part("a.png", png.clone()));
    let repeated = MultipartForm::new()
        .add_text("format", "png")
        .add_text("format", "jpeg")
        .add_part("files", helpers::file_part("a.png", png));

    for form in [as_file, not_utf8, repeated] {
        let response = server.post(CONVERT_PATH).multipart(form).await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "Missing or invalid 'format'" })
        );
    }
}

#[tokio::test]
async fn test_upload_size_limit() {
    let server = setup_test_server(Config {
        max_upload_size_bytes: Some(1024),
        ..helpers::test_config()
    });
    let form = conversion_form("png", vec![("large.png", vec![0u8; 4096])]);

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 413);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Request body exceeds the maximum upload size" })
    );
}

#[tokio::test]
async fn test_decode_pixel_limit() {
    let server = setup_test_server(Config {
        max_decode_pixels: Some(100),
        ..helpers::test_config()
    });
    let form = conversion_form("png", vec![("huge.png", create_test_png(50, 50))]);

    let response = server.post(CONVERT_PATH).multipart(form).await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to convert images" })
    );
}

#[tokio::test]
async fn test_request_id_header() {
    let server = default_server();
    let response = server.get("/health").await;

    let request_id = response.header("X-Request-ID");
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_static_dir_spa_fallback() {
    let dir = std::env::temp_dir().join(format!("imgconv-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html>imgconv</html>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log('ok')").unwrap();

    let server = setup_test_server(Config {
        static_dir: Some(dir.to_string_lossy().into_owned()),
        ..helpers::test_config()
    });

    let asset = server.get("/app.js").await;
    assert_eq!(asset.status_code(), 200);
    assert_eq!(asset.text(), "console.log('ok')");

    let route = server.get("/settings/profile").await;
    assert_eq!(route.status_code(), 200);
    assert_eq!(route.text(), "<html>imgconv</html>");

    let api = server.get("/api/formats").await;
    assert_eq!(api.status_code(), 200);
    assert!(api.json::<Value>()["formats"].is_array());

    std::fs::remove_dir_all(&dir).ok();
}
