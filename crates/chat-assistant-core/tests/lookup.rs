use chat_assistant_core::{BitcoinClient, WeatherClient};
use chrono::NaiveDate;
use mockito::{Matcher, Server};

#[tokio::test]
async fn test_bitcoin_history_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/bpi/historical/close.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "2023-01-01".into()),
            Matcher::UrlEncoded("end".into(), "2023-01-03".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"bpi":{"2023-01-02":16625.1,"2023-01-01":16547.5,"2023-01-03":16679.9}}"#)
        .create_async()
        .await;

    let client = BitcoinClient::new(&server.url());
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
    let history = client.fetch_history(start, end).await.unwrap();

    assert_eq!(history.len(), 3);
    assert_eq!(history.first_date(), Some(start));
    assert_eq!(history.last_date(), Some(end));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bitcoin_error_status_reports_code() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/bpi/historical/close.json")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let client = BitcoinClient::new(&server.url());
    let day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let err = client.fetch_history(day, day).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_weather_current() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/current.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("key".into(), "wk-test".into()),
            Matcher::UrlEncoded("q".into(), "Madrid".into()),
            Matcher::UrlEncoded("aqi".into(), "no".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"location":{"name":"Madrid"},"current":{"temp_c":18.5,"humidity":55,"wind_kph":9.0,"condition":{"text":"Partly cloudy"}}}"#,
        )
        .create_async()
        .await;

    let client = WeatherClient::new(&server.url(), "wk-test");
    let report = client.current("Madrid").await.unwrap();

    assert_eq!(report.city, "Madrid");
    assert_eq!(report.temp_c, 18.5);
    assert_eq!(report.description, "Partly cloudy");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_weather_error_status_reports_code() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/current.json")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let client = WeatherClient::new(&server.url(), "bad-key");
    let err = client.current("Madrid").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
