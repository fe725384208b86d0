use serde::Deserialize;
use tracing::{debug, error};

/// Public country list; only the names are requested.
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all?fields=name";

#[derive(Debug, Deserialize)]
pub struct Country {
    pub name: CountryName,
}

#[derive(Debug, Deserialize)]
pub struct CountryName {
    pub common: String,
}

/// Common names of `countries`, sorted. Duplicates are kept as given.
pub fn sorted_country_names(countries: Vec<Country>) -> Vec<String> {
    let mut names: Vec<String> = countries.into_iter().map(|c| c.name.common).collect();
    names.sort();
    names
}

pub async fn fetch_country_names(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<String>, reqwest::Error> {
    let countries: Vec<Country> = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .inspect_err(|e| error!("Country list request failed: {}", e))?
        .json()
        .await
        .inspect_err(|e| error!("Country list decode failed: {}", e))?;

    debug!("Fetched {} countries", countries.len());
    Ok(sorted_country_names(countries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    fn country(name: &str) -> Country {
        Country {
            name: CountryName {
                common: name.to_string(),
            },
        }
    }

    #[test]
    fn names_are_sorted_and_duplicates_kept() {
        let names = sorted_country_names(vec![
            country("Peru"),
            country("Chad"),
            country("Åland Islands"),
            country("Chad"),
            country("Albania"),
        ]);
        assert_eq!(names, vec!["Albania", "Chad", "Chad", "Peru", "Åland Islands"]);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn fetches_names_from_endpoint() {
        let app = Router::new().route(
            "/all",
            get(|| async {
                Json(json!([
                    {"name": {"common": "Norway", "official": "Kingdom of Norway"}},
                    {"name": {"common": "Kenya"}, "cca2": "KE"}
                ]))
            }),
        );
        let base = serve(app).await;

        let names = fetch_country_names(&reqwest::Client::new(), &format!("{}/all", base))
            .await
            .unwrap();
        assert_eq!(names, vec!["Kenya", "Norway"]);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let app = Router::new().route("/all", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(app).await;

        let result = fetch_country_names(&reqwest::Client::new(), &format!("{}/all", base)).await;
        assert!(result.is_err());
    }
}
