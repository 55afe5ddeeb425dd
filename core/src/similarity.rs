//! Cosine nearest-neighbor search over L2-normalized sparse rows.
//!
//! Two scorers share one contract: [`ExactScan`] computes the dot product with
//! every row, [`PostingsIndex`] walks per-term postings and only touches rows
//! sharing a term with the query. Both accumulate each row's products in
//! ascending term order, so their scores are bit-identical and the ranking
//! (score descending, recipe id ascending) is the same whichever one runs.
use crate::config::{IndexConfig, IndexKind};
use crate::error::{Error, Result};
use crate::{Neighbor, RecipeId, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sparse vector with strictly ascending term ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<TermId>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Zero entries are dropped.
    pub fn from_map(map: BTreeMap<TermId, f32>) -> Self {
        let (indices, values) = map.into_iter().filter(|(_, v)| *v != 0.0).unzip();
        Self { indices, values }
    }

    pub fn from_pairs<I: IntoIterator<Item = (TermId, f32)>>(pairs: I) -> Self {
        let mut map = BTreeMap::new();
        for (t, v) in pairs {
            *map.entry(t).or_insert(0.0) += v;
        }
        Self::from_map(map)
    }

    pub fn indices(&self) -> &[TermId] { &self.indices }
    pub fn values(&self) -> &[f32] { &self.values }
    pub fn nnz(&self) -> usize { self.indices.len() }
    pub fn is_zero(&self) -> bool { self.indices.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Unit-length copy; the zero vector stays zero.
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self.clone();
        }
        Self { indices: self.indices.clone(), values: self.values.iter().map(|v| v / norm).collect() }
    }

    /// Sum of `self[t] * other[t]` over shared terms, ascending by term.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

    /// Why this vector cannot be a row of a `dims`-term index, if it cannot.
    fn defect(&self, dims: usize) -> Option<String> {
        if self.indices.len() != self.values.len() {
            return Some(format!("{} term ids with {} values", self.indices.len(), self.values.len()));
        }
        if self.indices.windows(2).any(|w| w[0] >= w[1]) {
            return Some("term ids not strictly ascending".into());
        }
        if let Some(&last) = self.indices.last() {
            if last as usize >= dims {
                return Some(format!("term {last} outside vocabulary of {dims}"));
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Some("non-finite weight".into());
        }
        None
    }
}

/// Produces one score per indexed row for a (normalized) query.
pub trait Scorer {
    fn kind(&self) -> IndexKind;
    fn score_all(&self, query: &SparseVector) -> Vec<f32>;
}

/// Brute-force cosine against every row.
pub struct ExactScan<'a> {
    rows: &'a [SparseVector],
}

impl Scorer for ExactScan<'_> {
    fn kind(&self) -> IndexKind { IndexKind::Exact }

    fn score_all(&self, query: &SparseVector) -> Vec<f32> {
        self.rows.iter().map(|row| query.dot(row)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Posting {
    pub row: u32,
    pub weight: f32,
}

/// Term -> rows containing it, with the row's normalized weight.
/// Never persisted; rebuilt from the rows on load.
#[derive(Debug, Clone)]
pub struct PostingsIndex {
    num_rows: usize,
    postings: Vec<Vec<Posting>>, // by term id, rows ascending
}

impl PostingsIndex {
    pub fn build(rows: &[SparseVector], dims: usize) -> Self {
        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); dims];
        for (row, vector) in rows.iter().enumerate() {
            for (term, weight) in vector.iter() {
                if let Some(list) = postings.get_mut(term as usize) {
                    list.push(Posting { row: row as u32, weight });
                }
            }
        }
        Self { num_rows: rows.len(), postings }
    }

    pub fn num_rows(&self) -> usize { self.num_rows }
    pub fn num_terms(&self) -> usize { self.postings.len() }
}

impl Scorer for PostingsIndex {
    fn kind(&self) -> IndexKind { IndexKind::Postings }

    fn score_all(&self, query: &SparseVector) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_rows];
        for (term, q_w) in query.iter() {
            if let Some(list) = self.postings.get(term as usize) {
                for p in list {
                    scores[p.row as usize] += q_w * p.weight;
                }
            }
        }
        scores
    }
}

/// Serializable contents of a [`SimilarityIndex`]. The accelerator itself is
/// not stored, only which scorer the index was built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexState {
    pub ids: Vec<RecipeId>,
    pub rows: Vec<SparseVector>,
    pub dims: usize,
    pub kind: IndexKind,
}

/// All recipe vectors of one trained model, plus an optional accelerator.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    state: IndexState,
    accelerator: Option<PostingsIndex>,
    positions: HashMap<RecipeId, usize>,
}

impl SimilarityIndex {
    /// Normalizes `rows` and builds the accelerator if `config` asks for one.
    pub fn build(ids: Vec<RecipeId>, rows: Vec<SparseVector>, dims: usize, config: &IndexConfig) -> Result<Self> {
        let rows: Vec<SparseVector> = rows.iter().map(SparseVector::normalized).collect();
        let kind = config.kind_for(rows.len());
        let index = Self::from_state(IndexState { ids, rows, dims, kind })?;
        tracing::info!(rows = index.len(), dims, kind = ?index.kind(), "similarity index built");
        Ok(index)
    }

    /// Rows are taken as already normalized. Every row is checked against
    /// `dims` before the accelerator is rebuilt from them.
    pub fn from_state(state: IndexState) -> Result<Self> {
        if state.ids.len() != state.rows.len() {
            return Err(Error::Persistence(format!(
                "{} recipe ids for {} vectors",
                state.ids.len(),
                state.rows.len()
            )));
        }
        if state.rows.len() > u32::MAX as usize {
            return Err(Error::Persistence(format!("{} rows exceed the index capacity", state.rows.len())));
        }
        for (pos, row) in state.rows.iter().enumerate() {
            if let Some(defect) = row.defect(state.dims) {
                return Err(Error::Persistence(format!("row {pos} (recipe {}): {defect}", state.ids[pos])));
            }
        }
        let mut positions = HashMap::with_capacity(state.ids.len());
        for (pos, &id) in state.ids.iter().enumerate() {
            if positions.insert(id, pos).is_some() {
                return Err(Error::Persistence(format!("recipe {id} indexed twice")));
            }
        }
        let accelerator = match state.kind {
            IndexKind::Postings => Some(PostingsIndex::build(&state.rows, state.dims)),
            IndexKind::Exact => None,
        };
        Ok(Self { state, accelerator, positions })
    }

    pub fn state(&self) -> &IndexState { &self.state }
    pub fn len(&self) -> usize { self.state.ids.len() }
    pub fn is_empty(&self) -> bool { self.state.ids.is_empty() }
    pub fn dims(&self) -> usize { self.state.dims }
    pub fn ids(&self) -> &[RecipeId] { &self.state.ids }
    pub fn rows(&self) -> &[SparseVector] { &self.state.rows }
    pub fn kind(&self) -> IndexKind { self.state.kind }
    pub fn accelerator(&self) -> Option<&PostingsIndex> { self.accelerator.as_ref() }

    pub fn exact(&self) -> ExactScan<'_> { ExactScan { rows: &self.state.rows } }

    /// Stored (normalized) vector for a recipe.
    pub fn vector(&self, id: RecipeId) -> Option<&SparseVector> {
        self.positions.get(&id).map(|&pos| &self.state.rows[pos])
    }

    pub fn contains(&self, id: RecipeId) -> bool { self.positions.contains_key(&id) }

    /// Top `k` rows by cosine similarity, via the accelerator when present.
    pub fn query_nearest(&self, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        match &self.accelerator {
            Some(acc) => self.query_nearest_with(acc, query, k),
            None => self.query_nearest_with(&self.exact(), query, k),
        }
    }

    pub fn query_nearest_with(&self, scorer: &dyn Scorer, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }
        let query = query.normalized();
        let scores = scorer.score_all(&query);
        top_k(&self.state.ids, &scores, k)
    }
}

/// Highest scores first; equal scores by ascending recipe id.
fn top_k(ids: &[RecipeId], scores: &[f32], k: usize) -> Vec<Neighbor> {
    let mut hits: Vec<Neighbor> =
        ids.iter().zip(scores).map(|(&recipe_id, &score)| Neighbor { recipe_id, score }).collect();
    let order = |a: &Neighbor, b: &Neighbor| b.score.total_cmp(&a.score).then(a.recipe_id.cmp(&b.recipe_id));
    if k < hits.len() {
        hits.select_nth_unstable_by(k - 1, order);
        hits.truncate(k);
    }
    hits.sort_unstable_by(order);
    hits
}
