use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::health::integrity_check,
        api::books::list_books,
        api::books::create_book,
        api::books::get_book,
        api::books::delete_book,
        api::books::rename_book,
        api::books::list_book_authors,
        api::books::replace_book_authors,
        api::author::list_authors,
        api::author::create_author,
        api::author::get_author,
        api::author::delete_author,
        api::author::list_author_books,
        api::author::merge_author,
        api::book_author::link,
        api::book_author::unlink,
    ),
    tags(
        (name = "bibliolink", description = "Book/author catalog API")
    )
)]
pub struct ApiDoc;
