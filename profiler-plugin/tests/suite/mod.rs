mod delete_uri;
mod lifecycle;
