// Esquema Diesel para SQLite.
// Tabla única `records`: cada fila es un registro de una colección con sus
// campos serializados como JSON en `data`.
diesel::table! {
    records (collection, id) {
        id -> Text,
        collection -> Text,
        created -> Text,
        updated -> Text,
        data -> Text,
        password_hash -> Nullable<Text>,
    }
}
