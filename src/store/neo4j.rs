//! Backend Neo4j: cada colección es una etiqueta de nodo (`:Folder`, `:File`,
//! `:Note`) y cada campo del documento es una propiedad del nodo.
//!
//! Los nombres de campo se interpolan en el Cypher, por eso sólo se aceptan
//! los definidos en `Collection::fields`. Los valores siempre van como
//! parámetros.

use async_trait::async_trait;
use neo4rs::{query, Graph, Node, Query};
use tracing::info;

use super::{sanitize_changes, stamp_new, Collection, Document, Filter, Store, CREATED_AT_FIELD};
use crate::error::StoreResult;

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Abre el pool de conexiones y comprueba que el servidor responde.
    pub async fn connect(addr: &str, user: &str, password: &str) -> StoreResult<Self> {
        info!("Conectando a Neo4j en {addr}...");
        let graph = Graph::new(addr, user, password).await?;
        let store = Self { graph };
        store.ping().await?;
        info!("Conexión a Neo4j OK");
        Ok(store)
    }

    /// Crea constraints de unicidad sobre `id` e índices sobre las
    /// referencias al padre, que son las que recorre el borrado en cascada.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let statements = [
            "CREATE CONSTRAINT folder_id IF NOT EXISTS
             FOR (f:Folder)
             REQUIRE f.id IS UNIQUE",
            "CREATE CONSTRAINT file_id IF NOT EXISTS
             FOR (f:File)
             REQUIRE f.id IS UNIQUE",
            "CREATE CONSTRAINT note_id IF NOT EXISTS
             FOR (n:Note)
             REQUIRE n.id IS UNIQUE",
            "CREATE INDEX file_folder_id IF NOT EXISTS
             FOR (f:File)
             ON (f.folderId)",
            "CREATE INDEX note_file_id IF NOT EXISTS
             FOR (n:Note)
             ON (n.fileId)",
        ];

        for stmt in statements {
            self.graph.run(query(stmt)).await?;
        }

        info!("Esquema de Neo4j asegurado (constraints e índices creados).");
        Ok(())
    }

    /// Ejecuta una consulta que devuelve nodos en la columna `n`.
    async fn fetch_nodes(&self, collection: Collection, q: Query) -> StoreResult<Vec<Document>> {
        let mut cursor = self.graph.execute(q).await?;
        let mut docs = Vec::new();
        while let Some(row) = cursor.next().await? {
            if let Some(node) = row.get::<Node>("n") {
                docs.push(node_to_document(collection, &node));
            }
        }
        Ok(docs)
    }

    /// Ejecuta una consulta que devuelve un único entero en la columna `deleted`.
    async fn fetch_count(&self, q: Query) -> StoreResult<u64> {
        let mut cursor = self.graph.execute(q).await?;
        let deleted = match cursor.next().await? {
            Some(row) => row.get::<i64>("deleted").unwrap_or(0),
            None => 0,
        };
        Ok(deleted.max(0) as u64)
    }
}

fn node_to_document(collection: Collection, node: &Node) -> Document {
    collection
        .fields()
        .iter()
        .filter_map(|field| {
            node.get::<String>(field)
                .map(|value| (field.to_string(), value))
        })
        .collect()
}

/// Texto Cypher `<cabeza> SET n.campo = $campo, ... <cola>`. Sin campos no hay `SET`.
fn assignment_cypher(cypher_head: &str, cypher_tail: &str, fields: &Document) -> String {
    let assignments: Vec<String> = fields
        .keys()
        .map(|field| format!("n.{field} = ${field}"))
        .collect();

    if assignments.is_empty() {
        format!("{cypher_head} {cypher_tail}")
    } else {
        format!("{cypher_head} SET {} {cypher_tail}", assignments.join(", "))
    }
}

fn bind_fields(q: Query, fields: &Document) -> Query {
    fields
        .iter()
        .fold(q, |q, (field, value)| q.param(field, value.clone()))
}

/// Valida y estampa el alta, y devuelve el Cypher junto con el documento final.
fn insert_statement(collection: Collection, fields: Document) -> StoreResult<(String, Document)> {
    let doc = stamp_new(collection, fields)?;
    let cypher = assignment_cypher(&format!("CREATE (n:{})", collection.label()), "", &doc);
    Ok((cypher, doc))
}

/// Los campos de sistema se descartan antes de construir el `SET`.
fn update_statement(collection: Collection, changes: Document) -> StoreResult<(String, Document)> {
    let changes = sanitize_changes(collection, changes)?;
    let cypher = assignment_cypher(
        &format!("MATCH (n:{} {{id: $id}})", collection.label()),
        "RETURN n",
        &changes,
    );
    Ok((cypher, changes))
}

#[async_trait]
impl Store for Neo4jStore {
    async fn insert(&self, collection: Collection, fields: Document) -> StoreResult<Document> {
        let (cypher, doc) = insert_statement(collection, fields)?;
        self.graph.run(bind_fields(query(&cypher), &doc)).await?;
        Ok(doc)
    }

    async fn find_all(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<Document>> {
        let label = collection.label();
        let q = match filter {
            Some(filter) => {
                collection.check_field(&filter.field)?;
                query(&format!(
                    "MATCH (n:{label}) WHERE n.{} = $value RETURN n ORDER BY n.{CREATED_AT_FIELD}",
                    filter.field
                ))
                .param("value", filter.value.clone())
            }
            None => query(&format!(
                "MATCH (n:{label}) RETURN n ORDER BY n.{CREATED_AT_FIELD}"
            )),
        };
        self.fetch_nodes(collection, q).await
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let q = query(&format!("MATCH (n:{} {{id: $id}}) RETURN n", collection.label()))
            .param("id", id);
        Ok(self.fetch_nodes(collection, q).await?.into_iter().next())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>> {
        // `$id` no puede colisionar con un parámetro de campo: `id` se descarta en `update_statement`.
        let (cypher, changes) = update_statement(collection, changes)?;
        let q = bind_fields(query(&cypher), &changes).param("id", id);
        Ok(self.fetch_nodes(collection, q).await?.into_iter().next())
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let q = query(&format!(
            "MATCH (n:{} {{id: $id}}) DETACH DELETE n RETURN count(*) AS deleted",
            collection.label()
        ))
        .param("id", id);
        Ok(self.fetch_count(q).await? > 0)
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        collection.check_field(&filter.field)?;
        let q = query(&format!(
            "MATCH (n:{}) WHERE n.{} = $value DETACH DELETE n RETURN count(*) AS deleted",
            collection.label(),
            filter.field
        ))
        .param("value", filter.value.clone());
        self.fetch_count(q).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }
}
