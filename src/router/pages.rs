//! # Páginas HTML
//! src/router/pages.rs
//!
//! HTML que genera el servidor: la página de búsqueda, la lista de
//! resultados y el cuerpo del 404 de archivos estáticos.

use crate::http::url::escape_html;
use crate::search::QueryResult;

/// Logo y formulario de búsqueda; toda respuesta de consulta empieza así
pub const LANDING_PAGE: &str = concat!(
    "<html><head><title>333gle</title></head>\n",
    "<body>\n",
    "<center style=\"font-size:500%;\">\n",
    "<span style=\"position:relative;bottom:-0.33em;color:orange;\">3</span>",
    "<span style=\"color:red;\">3</span>",
    "<span style=\"color:gold;\">3</span>",
    "<span style=\"color:blue;\">g</span>",
    "<span style=\"color:green;\">l</span>",
    "<span style=\"color:red;\">e</span>\n",
    "</center>\n",
    "<p>\n",
    "<div style=\"height:20px;\"></div>\n",
    "<center>\n",
    "<form action=\"/query\" method=\"get\">\n",
    "<input type=\"text\" size=30 name=\"terms\" />\n",
    "<input type=\"submit\" value=\"Search\" />\n",
    "</form>\n",
    "</center><p>\n",
);

/// Cierre de la página de búsqueda
pub const PAGE_FOOTER: &str = "</body>\r\n</html>\r\n";

/// Cuerpo del 404 para `/static/<file_name>`
///
/// # Ejemplo
/// ```
/// use search_server::router::pages::file_not_found;
///
/// assert_eq!(
///     file_not_found("<x>.png"),
///     "<html><body>Couldn't find file \"&lt;x&gt;.png\"</body></html>\n"
/// );
/// ```
pub fn file_not_found(file_name: &str) -> String {
    format!(
        "<html><body>Couldn't find file \"{}\"</body></html>\n",
        escape_html(file_name)
    )
}

/// Bloque de resultados que va entre el formulario y el cierre
pub fn results_section(query: &str, results: &[QueryResult]) -> String {
    let query = escape_html(query);

    if results.is_empty() {
        return format!("<p><br>\r\nNo results found for <b>{}</b>\r\n<p>\r\n\r\n", query);
    }

    let mut html = format!(
        "<p><br>\r\n{} {} found for <b>{}</b>\r\n<p>\r\n\r\n<ul>\r\n",
        results.len(),
        if results.len() == 1 { "result" } else { "results" },
        query
    );

    for result in results {
        html.push_str(&format!(
            " <li> <a href=\"{}\">{}</a> [{}]<br>\r\n",
            escape_html(&document_link(&result.document_name)),
            escape_html(&result.document_name),
            result.rank
        ));
    }

    html.push_str("</ul>\r\n");
    html
}

/// Los documentos locales se sirven bajo `/static/`; las URLs absolutas no
fn document_link(document_name: &str) -> String {
    if document_name.starts_with("http://") {
        document_name.to_string()
    } else {
        format!("/static/{}", document_name)
    }
}
