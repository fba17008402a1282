use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::models::review::Review;
use crate::AppState;

const MAX_STARS: i32 = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_reviews))
}

async fn list_reviews(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let reviews = state.reviews.list_reviews().await?;
    Ok(Html(render_page(&reviews)))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn stars(rating: i32) -> String {
    let filled = rating.clamp(0, MAX_STARS) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_STARS as usize - filled)
    )
}

pub fn render_page(reviews: &[Review]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Customer Reviews</title>\n</head>\n<body>\n<h1>Customer Reviews</h1>\n",
    );

    if reviews.is_empty() {
        html.push_str("<p>No reviews yet.</p>\n");
    }

    for review in reviews {
        let author = review
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous");

        html.push_str(&format!(
            "<div class=\"review\">\n<h3>{}</h3>\n<p class=\"rating\" title=\"{} out of {MAX_STARS}\">{}</p>\n<p>{}</p>\n<small>{}</small>\n</div>\n",
            html_escape(author),
            review.rating,
            stars(review.rating),
            html_escape(&review.comments),
            review.date_submitted.format("%d %B %Y"),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}
