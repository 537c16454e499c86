//! PostgreSQL implementation of GraphRepository.

use crate::connection::{PgPool, build_pool, database_url, run_migrations};
use crate::schema::{graph_edges, graph_nodes};
use crate::{DatabaseResult, GraphEdgeRow, GraphNodeRow, NewGraphEdgeRow, NewGraphNodeRow};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use palimpsest_error::{DatabaseError, DatabaseErrorKind, PalimpsestResult};
use palimpsest_interface::{EdgeRecord, GraphDump, GraphRepository, NodeRecord};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Rows per INSERT statement, well under the Postgres bind parameter limit.
const INSERT_BATCH: usize = 1000;

fn insert_nodes(conn: &mut PgConnection, rows: &[NewGraphNodeRow]) -> DatabaseResult<()> {
    for chunk in rows.chunks(INSERT_BATCH) {
        diesel::insert_into(graph_nodes::table)
            .values(chunk)
            .execute(conn)?;
    }
    Ok(())
}

fn insert_edges(conn: &mut PgConnection, rows: &[NewGraphEdgeRow]) -> DatabaseResult<()> {
    let mut endpoints: BTreeSet<String> = rows
        .iter()
        .flat_map(|row| [row.from_id.clone(), row.to_id.clone()])
        .collect();
    let wanted: Vec<String> = endpoints.iter().cloned().collect();
    let found: Vec<String> = graph_nodes::table
        .select(graph_nodes::id)
        .filter(graph_nodes::id.eq_any(&wanted))
        .load(conn)?;
    for id in &found {
        endpoints.remove(id);
    }
    if let Some(missing) = endpoints.into_iter().next() {
        return Err(DatabaseError::new(DatabaseErrorKind::DanglingEndpoint(missing)));
    }
    for chunk in rows.chunks(INSERT_BATCH) {
        diesel::insert_into(graph_edges::table)
            .values(chunk)
            .execute(conn)?;
    }
    Ok(())
}

fn load_dump(conn: &mut PgConnection) -> DatabaseResult<GraphDump> {
    let nodes = graph_nodes::table
        .select(GraphNodeRow::as_select())
        .order(graph_nodes::id.asc())
        .load(conn)?
        .into_iter()
        .map(NodeRecord::try_from)
        .collect::<DatabaseResult<Vec<_>>>()?;
    let edges = graph_edges::table
        .select(GraphEdgeRow::as_select())
        .order(graph_edges::id.asc())
        .load(conn)?
        .into_iter()
        .map(EdgeRecord::try_from)
        .collect::<DatabaseResult<Vec<_>>>()?;
    Ok(GraphDump { nodes, edges })
}

/// [`GraphRepository`] over the `graph_nodes` and `graph_edges` tables.
///
/// Every call runs in one database transaction on a pooled connection,
/// inside `spawn_blocking` so diesel's synchronous I/O stays off the async
/// workers.
#[derive(Clone)]
pub struct PostgresGraphRepository {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresGraphRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresGraphRepository")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl PostgresGraphRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `DATABASE_URL` with a pool of `pool_size` connections and
    /// apply pending migrations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use palimpsest_database::PostgresGraphRepository;
    ///
    /// // Requires DATABASE_URL=postgresql://localhost/palimpsest in environment
    /// let repository = PostgresGraphRepository::from_env(4)
    ///     .expect("Failed to connect");
    /// ```
    pub fn from_env(pool_size: u32) -> DatabaseResult<Self> {
        let pool = build_pool(&database_url()?, pool_size)?;
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
        run_migrations(&mut conn)?;
        info!(pool_size, "Connected graph repository");
        Ok(Self { pool })
    }

    /// Run `op` in one transaction on a pooled connection.
    async fn transaction<T, F>(&self, op: F) -> DatabaseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> DatabaseResult<T> {
            let mut pooled = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
            let conn: &mut PgConnection = &mut pooled;
            conn.transaction(op)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Worker(e.to_string())))?
    }

    /// Replace the full contents of both tables with `dump`.
    #[instrument(skip(self, dump), fields(nodes = dump.nodes.len(), edges = dump.edges.len()))]
    pub async fn replace_with(&self, dump: GraphDump) -> PalimpsestResult<()> {
        validate(&dump.nodes, &dump.edges)?;
        let nodes: Vec<NewGraphNodeRow> = dump.nodes.into_iter().map(Into::into).collect();
        let edges: Vec<NewGraphEdgeRow> = dump.edges.into_iter().map(Into::into).collect();
        self.transaction(move |conn| {
            diesel::delete(graph_edges::table).execute(conn)?;
            let removed = diesel::delete(graph_nodes::table).execute(conn)?;
            debug!(removed, "Cleared graph tables");
            insert_nodes(conn, &nodes)?;
            insert_edges(conn, &edges)
        })
        .await?;
        info!("Replaced graph contents");
        Ok(())
    }
}

fn validate(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> PalimpsestResult<()> {
    for node in nodes {
        node.validate()?;
    }
    for edge in edges {
        edge.validate()?;
    }
    Ok(())
}

#[async_trait]
impl GraphRepository for PostgresGraphRepository {
    #[instrument(skip(self, nodes), fields(count = nodes.len()))]
    async fn insert_nodes(&self, nodes: Vec<NodeRecord>) -> PalimpsestResult<()> {
        validate(&nodes, &[])?;
        let rows: Vec<NewGraphNodeRow> = nodes.into_iter().map(Into::into).collect();
        self.transaction(move |conn| insert_nodes(conn, &rows))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, edges), fields(count = edges.len()))]
    async fn insert_edges(&self, edges: Vec<EdgeRecord>) -> PalimpsestResult<()> {
        validate(&[], &edges)?;
        let rows: Vec<NewGraphEdgeRow> = edges.into_iter().map(Into::into).collect();
        self.transaction(move |conn| insert_edges(conn, &rows))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_nodes(&self, ids: &[String]) -> PalimpsestResult<()> {
        let ids = ids.to_vec();
        let removed = self
            .transaction(move |conn| {
                diesel::delete(
                    graph_edges::table.filter(
                        graph_edges::from_id
                            .eq_any(&ids)
                            .or(graph_edges::to_id.eq_any(&ids)),
                    ),
                )
                .execute(conn)?;
                let removed = diesel::delete(graph_nodes::table.filter(graph_nodes::id.eq_any(&ids)))
                    .execute(conn)?;
                Ok(removed)
            })
            .await?;
        debug!(removed, "Deleted nodes");
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_edges(&self, ids: &[String]) -> PalimpsestResult<()> {
        let ids = ids.to_vec();
        let removed = self
            .transaction(move |conn| {
                diesel::delete(graph_edges::table.filter(graph_edges::id.eq_any(&ids)))
                    .execute(conn)
                    .map_err(Into::into)
            })
            .await?;
        debug!(removed, "Deleted edges");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn snapshot(&self) -> PalimpsestResult<GraphDump> {
        let dump = self.transaction(load_dump).await?;
        debug!(
            nodes = dump.nodes.len(),
            edges = dump.edges.len(),
            "Loaded graph dump"
        );
        Ok(dump)
    }

    /// Insert nodes and edges in a single transaction.
    #[instrument(skip(self, dump), fields(nodes = dump.nodes.len(), edges = dump.edges.len()))]
    async fn load_dump(&self, dump: GraphDump) -> PalimpsestResult<()> {
        validate(&dump.nodes, &dump.edges)?;
        let nodes: Vec<NewGraphNodeRow> = dump.nodes.into_iter().map(Into::into).collect();
        let edges: Vec<NewGraphEdgeRow> = dump.edges.into_iter().map(Into::into).collect();
        self.transaction(move |conn| {
            insert_nodes(conn, &nodes)?;
            insert_edges(conn, &edges)
        })
        .await?;
        Ok(())
    }
}
