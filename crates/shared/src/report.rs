use chrono::{DateTime, Utc};

use crate::models::Article;
use crate::stats::{format_one_decimal, BucketStats, DailySeries, ReadingReport};

const TITLE: &str = "Pocket calculator";

const STYLE: &str = "<style>body{max-width:700px;margin:3em auto;font:24px charter,georgia,serif}h1{margin-bottom:0;text-decoration:underline}p{line-height:1.4;margin:1.5em 0}li{margin-block-end:1em}hr{margin-block:1.5em}</style>";

// Draws each series as a filled step chart, one canvas pixel per day.
const GRAPH_SCRIPT: &str = r#"
      var graphEl = document.getElementById('graphs');
      graphs.forEach(function (graph) {
        var data = graph.data;
        var max = data.reduce(function (a, b) { return Math.max(a, b); }, 0);
        var canvas = document.createElement('canvas');
        var ctx = canvas.getContext('2d');
        var p = document.createElement('p');
        p.textContent = graph.caption;

        var w = canvas.width = data.length;
        var h = canvas.height = Math.round(w * 9 / 16);
        var scale = max > 0 ? h / max : 0;
        canvas.style.width = '100%';
        canvas.style.marginBottom = '2em';
        canvas.style.imageRendering = 'crisp-edges';

        ctx.fillStyle = '#fff';
        ctx.fillRect(0, 0, w, h);
        ctx.fillStyle = '#000';
        ctx.moveTo(0, h);
        data.forEach(function (n, i) {
          ctx.lineTo(i, h - n * scale);
          ctx.lineTo(i + 1, h - n * scale);
        });
        ctx.lineTo(w, h);
        ctx.fill();

        graphEl.append(p);
        graphEl.append(canvas);
      });
"#;

pub struct ReportGenerator;

impl ReportGenerator {
    fn page(body: &str) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!("  <title>{}</title>\n", TITLE));
        html.push_str(&format!("  {}\n", STYLE));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", TITLE));
        html.push_str(body);
        html.push_str("</body>\n</html>");
        html
    }

    pub fn landing_page() -> String {
        Self::page(
            "<p>To view your Pocket stats, you must first <a href=\"/auth\">authorize this application</a>.</p>\n",
        )
    }

    pub fn error_page(heading: &str, message: &str) -> String {
        let mut body = String::new();
        body.push_str(&format!(
            "<h2 style=\"margin-top:0;font-size:0.8em\">{}</h2>\n",
            Self::escape_html(heading)
        ));
        body.push_str(&format!("<p>{}</p>\n", Self::escape_html(message)));
        body.push_str("<p><a href=\"/\">Start over</a></p>\n");
        Self::page(&body)
    }

    pub fn generate(report: &ReadingReport<'_>, username: &str, now: DateTime<Utc>) -> String {
        let mut body = String::new();

        body.push_str(&format!(
            "<h2 style=\"margin-top:0;font-size:0.8em\">{}&nbsp;&nbsp;•&nbsp;&nbsp;<span style=\"font-weight: normal\">{}</span></h2>\n",
            Self::escape_html(username),
            now.format("%Y-%m-%d")
        ));

        body.push_str(&Self::bucket_paragraph("unread", &report.unread));
        body.push_str(&Self::bucket_paragraph("read", &report.read));

        if let Some(first_day) = report.timeline.first_day() {
            let per_year = match report.books_per_year() {
                Some(books) => format_one_decimal(books),
                None => "0.0".to_string(),
            };
            body.push_str(&format!(
                "<p>You’ve been using Pocket since <strong>{},</strong> which means you read an average of <strong>{} books</strong> worth of content per year.</p>\n",
                first_day.format("%A, %B %-d, %Y"),
                per_year
            ));
        }

        body.push_str("<div id=\"graphs\"></div>\n");

        if let Some((longest, shortest)) = report.longest_and_shortest() {
            body.push_str(&Self::callout("longest", longest));
            body.push_str(&Self::callout("shortest", shortest));
        }

        if !report.articles_sorted.is_empty() {
            body.push_str("<hr/><h2>Unread articles, sorted by word count</h2>\n");
            body.push_str(&Self::article_list(&report.articles_sorted));
        }

        if !report.non_articles.is_empty() {
            body.push_str("<hr/><h2>Articles that Pocket couldn’t parse</h2>\n");
            body.push_str(&Self::article_list(&report.non_articles));
        }

        body.push_str(&Self::graph_script(&report.series));

        Self::page(&body)
    }

    fn bucket_paragraph(label: &str, stats: &BucketStats) -> String {
        format!(
            "<p>You have <strong>{} {} articles,</strong> with a total word count of <strong>{}</strong>. That’s about <strong>{} pages,</strong> or <strong>{} books.</strong></p>\n",
            stats.count,
            label,
            stats.word_count,
            stats.page_count,
            stats.book_count_display()
        )
    }

    fn callout(which: &str, article: &Article) -> String {
        format!(
            "<p>Your {} unread article is {}, at {} words.</p>\n",
            which,
            Self::link(article),
            article.word_count
        )
    }

    fn link(article: &Article) -> String {
        format!(
            "<a href=\"{}\">{}</a>",
            Self::escape_html(&article.resolved_url),
            Self::escape_html(article.display_title())
        )
    }

    fn article_list(articles: &[&Article]) -> String {
        let mut html = String::from("<ul>\n");
        for article in articles {
            html.push_str(&format!(
                "  <li>{}, at <strong>{}</strong> {}.</li>\n",
                Self::link(article),
                article.word_count,
                if article.word_count == 1 { "word" } else { "words" }
            ));
        }
        html.push_str("</ul>\n");
        html
    }

    fn graph_script(series: &DailySeries) -> String {
        let graphs = serde_json::json!([
            {
                "caption": "Unread article count over time:",
                "data": series.unread_article_count_by_day,
            },
            {
                "caption": "Unread word count over time:",
                "data": series.unread_word_count_by_day,
            },
            {
                "caption": "Words read over time:",
                "data": series.read_word_count_by_day,
            },
        ]);

        let mut html = String::from("<script>\n");
        html.push_str(&format!("      var graphs = {};\n", graphs));
        html.push_str(GRAPH_SCRIPT);
        html.push_str("</script>\n");
        html
    }

    pub fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}
