use std::rc::Rc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use dashboard_client::{api_call, ApiPathBuilder, HttpApiClient, MultipartForm, RequestBody};

use crate::{Mutation, Query, QueryClient, QueryKey, QueryOptions};

/// The query hooks of one proxy resource living at `/api/<name>`.
///
/// Reads are cached under [`QueryKey::list`] and [`QueryKey::detail`]. Every write invalidates
/// all list entries of the resource and, where the id is known, its detail entry. Nothing is
/// patched into the cache by hand, the next [`Query::ensure`] fetches the new state.
pub struct Resource<C> {
    api: Rc<C>,
    queries: QueryClient,
    name: String,
    options: QueryOptions,
}

impl<C> Clone for Resource<C> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            queries: self.queries.clone(),
            name: self.name.clone(),
            options: self.options,
        }
    }
}

impl<C> Resource<C>
where
    C: HttpApiClient + 'static,
{
    pub fn new(api: Rc<C>, queries: &QueryClient, name: impl Into<String>) -> Self {
        Self {
            api,
            queries: queries.clone(),
            name: name.into(),
            options: QueryOptions::default(),
        }
    }

    /// Options used for the read queries of this resource.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `/api/<name>`
    pub fn path(&self) -> String {
        ApiPathBuilder::resource(&self.name).build()
    }

    /// `/api/<name>/<id>`
    pub fn item_path(&self, id: &str) -> String {
        ApiPathBuilder::resource(&self.name).segment(id).build()
    }

    /// `GET /api/<name>`
    pub fn list<T>(&self) -> Query<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.read(QueryKey::list(&self.name), self.path())
    }

    /// `GET /api/<name>?<args>`, cached separately per argument set.
    pub fn list_with<T>(&self, args: &[(&str, &str)]) -> Query<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let path = args
            .iter()
            .fold(ApiPathBuilder::resource(&self.name), |builder, (name, value)| {
                builder.arg(name, value)
            })
            .build();

        let key = match path.split_once('?') {
            Some((_, query)) => QueryKey::list(&self.name).child(query),
            None => QueryKey::list(&self.name),
        };
        self.read(key, path)
    }

    /// `GET /api/<name>/<id>`
    pub fn detail<T>(&self, id: &str) -> Query<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.read(QueryKey::detail(&self.name, id), self.item_path(id))
    }

    /// `POST /api/<name>` with a JSON body.
    pub fn create<I, O>(&self) -> Mutation<I, O>
    where
        I: Serialize + 'static,
        O: DeserializeOwned + 'static,
    {
        let api = Rc::clone(&self.api);
        let path = self.path();
        Mutation::new(&self.queries, move |input: I| {
            let api = Rc::clone(&api);
            let path = path.clone();
            async move {
                let body = RequestBody::json(&input)?;
                api_call(&*api, Method::POST, &path, body).await
            }
        })
        .invalidates(QueryKey::list(&self.name))
    }

    /// `PATCH /api/<name>/<id>` with a JSON body holding the changed fields.
    pub fn update<I, O>(&self) -> Mutation<(String, I), O>
    where
        I: Serialize + 'static,
        O: DeserializeOwned + 'static,
    {
        self.write_item(Method::PATCH)
    }

    /// `PUT /api/<name>/<id>` with the complete record.
    pub fn replace<I, O>(&self) -> Mutation<(String, I), O>
    where
        I: Serialize + 'static,
        O: DeserializeOwned + 'static,
    {
        self.write_item(Method::PUT)
    }

    /// `DELETE /api/<name>/<id>`
    pub fn delete(&self) -> Mutation<String, ()> {
        let api = Rc::clone(&self.api);
        let resource = self.clone();
        let name = self.name.clone();
        Mutation::new(&self.queries, move |id: String| {
            let api = Rc::clone(&api);
            let path = resource.item_path(&id);
            async move { api.delete(&path).await?.nodata() }
        })
        .invalidates(QueryKey::list(&self.name))
        .invalidates_with(move |id: &String| vec![QueryKey::detail(&name, id)])
    }

    /// `POST /api/<name>/upload` with a multipart body, e.g. an image for the editor.
    pub fn upload<O>(&self) -> Mutation<MultipartForm, O>
    where
        O: DeserializeOwned + 'static,
    {
        let api = Rc::clone(&self.api);
        let path = ApiPathBuilder::resource(&self.name).segment("upload").build();
        Mutation::new(&self.queries, move |form: MultipartForm| {
            let api = Rc::clone(&api);
            let path = path.clone();
            async move { api_call(&*api, Method::POST, &path, RequestBody::from(form)).await }
        })
        .invalidates(QueryKey::list(&self.name))
    }

    fn read<T>(&self, key: QueryKey, path: String) -> Query<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let api = Rc::clone(&self.api);
        self.queries.query(
            key,
            move || {
                let api = Rc::clone(&api);
                let path = path.clone();
                async move { api_call(&*api, Method::GET, &path, RequestBody::Empty).await }
            },
            self.options,
        )
    }

    fn write_item<I, O>(&self, method: Method) -> Mutation<(String, I), O>
    where
        I: Serialize + 'static,
        O: DeserializeOwned + 'static,
    {
        let api = Rc::clone(&self.api);
        let resource = self.clone();
        let name = self.name.clone();
        Mutation::new(&self.queries, move |(id, input): (String, I)| {
            let api = Rc::clone(&api);
            let method = method.clone();
            let path = resource.item_path(&id);
            async move {
                let body = RequestBody::json(&input)?;
                api_call(&*api, method, &path, body).await
            }
        })
        .invalidates(QueryKey::list(&self.name))
        .invalidates_with(move |(id, _): &(String, I)| vec![QueryKey::detail(&name, id)])
    }
}
