use std::{path::Path, sync::Arc};

use crate::{
    cli::{connect, load_library, resolver_for},
    config, error,
    importer::{ImportOptions, Importer},
    retry::RetryPolicy,
};

pub async fn import(library_path: &Path, options: ImportOptions) {
    let library = load_library(library_path).await;
    let client = connect().await;
    let resolver = resolver_for(library_path, Arc::clone(&client), options.resolver_options()).await;

    let mut importer = Importer::new(&library, client, resolver, options)
        .with_retry(RetryPolicy::new(config::rate_limit_backoff()));

    if let Err(e) = importer.run().await {
        error!("Import failed: {}", e);
    }
}
