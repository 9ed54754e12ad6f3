use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::cache::CacheStore;
use crate::dependency::{Dependence, DependencyDeclaration};

/// Any error returned by a test body fails the test case.
pub type CaseResult = anyhow::Result<()>;

type CaseBody = Arc<dyn Fn(TestContext) -> BoxFuture<'static, CaseResult> + Send + Sync>;

/// Handed to each test body: the run cache and the id of the running case.
#[derive(Clone, Debug)]
pub struct TestContext {
    case_id: String,
    cache: Arc<CacheStore>,
}

impl TestContext {
    pub fn new(case_id: &str, cache: Arc<CacheStore>) -> Self {
        TestContext {
            case_id: case_id.to_string(),
            cache,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }
}

#[derive(Clone)]
pub struct TestCase {
    id: String,
    marks: Vec<String>,
    dependencies: Vec<Dependence>,
    body: CaseBody,
}

impl Debug for TestCase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("marks", &self.marks)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl TestCase {
    pub fn new<F, Fut>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CaseResult> + Send + 'static,
    {
        TestCase {
            id: id.into(),
            marks: Vec::new(),
            dependencies: Vec::new(),
            body: Arc::new(move |ctx: TestContext| -> BoxFuture<'static, CaseResult> {
                body(ctx).boxed()
            }),
        }
    }

    pub fn mark(mut self, mark: impl Into<String>) -> Self {
        let mark = mark.into();
        if !self.marks.contains(&mark) {
            self.marks.push(mark);
        }
        self
    }

    /// The case will only run once `prerequisite` has run and `key` is in the run cache.
    pub fn depends_on(mut self, prerequisite: impl Into<String>, key: impl Into<String>) -> Self {
        let dependence = Dependence::new(prerequisite, key);
        if !self.dependencies.contains(&dependence) {
            self.dependencies.push(dependence);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn marks(&self) -> &[String] {
        &self.marks
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }

    pub fn dependencies(&self) -> &[Dependence] {
        &self.dependencies
    }

    pub fn declarations(&self) -> Vec<DependencyDeclaration> {
        self.dependencies
            .iter()
            .map(|dependence| DependencyDeclaration::new(&self.id, dependence))
            .collect()
    }

    pub(crate) fn invoke(&self, ctx: TestContext) -> BoxFuture<'static, CaseResult> {
        (self.body)(ctx)
    }
}

/// A table of parameter rows expanded into one test case per row, identified as `name[row_id]`.
pub struct Parametrized<P> {
    name: String,
    rows: Vec<(String, P)>,
    marks: Vec<String>,
    dependencies: Vec<Dependence>,
}

impl<P> Parametrized<P>
where
    P: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Parametrized {
            name: name.into(),
            rows: Vec::new(),
            marks: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn row(mut self, id: impl Into<String>, params: P) -> Self {
        self.rows.push((id.into(), params));
        self
    }

    pub fn mark(mut self, mark: impl Into<String>) -> Self {
        self.marks.push(mark.into());
        self
    }

    pub fn depends_on(mut self, prerequisite: impl Into<String>, key: impl Into<String>) -> Self {
        self.dependencies.push(Dependence::new(prerequisite, key));
        self
    }

    pub fn cases<F, Fut>(self, body: F) -> Vec<TestCase>
    where
        F: Fn(TestContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CaseResult> + Send + 'static,
    {
        let body = Arc::new(body);
        self.rows
            .into_iter()
            .map(|(row_id, params)| {
                let body = body.clone();
                let mut case = TestCase::new(format!("{}[{}]", self.name, row_id), move |ctx| {
                    body(ctx, params.clone())
                });
                for mark in &self.marks {
                    case = case.mark(mark.clone());
                }
                for dependence in &self.dependencies {
                    case = case.depends_on(dependence.prerequisite.clone(), dependence.key.clone());
                }
                case
            })
            .collect()
    }
}

/// Test cases in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Suite {
    cases: Vec<TestCase>,
}

impl Suite {
    pub fn new() -> Self {
        Suite::default()
    }

    pub fn with(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn with_all(mut self, cases: impl IntoIterator<Item = TestCase>) -> Self {
        self.cases.extend(cases);
        self
    }

    pub fn push(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn get(&self, id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|case| case.id == id)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
