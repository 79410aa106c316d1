//! Registers every exported `Service` as a singleton, then resolves them by
//! contract and by key.
//!
//! Run with `RUST_LOG=service_scan=debug` to see what the scans register.

use std::sync::Arc;

use service_scan::prelude::*;
use service_scan::export_type;

pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Default)]
pub struct FileService;

impl Service for FileService {
    fn name(&self) -> &'static str {
        "files"
    }
}

#[derive(Default)]
pub struct ImageService;

impl Service for ImageService {
    fn name(&self) -> &'static str {
        "images"
    }
}

fn describe_file_service() -> TypeDescriptor {
    TypeDescriptor::of_default::<FileService>()
        .implements::<dyn Service>(|this| this)
        .build()
}

fn describe_image_service() -> TypeDescriptor {
    TypeDescriptor::of_default::<ImageService>()
        .implements::<dyn Service>(|this| this)
        .build()
}

export_type!(describe_file_service);
export_type!(describe_image_service);

fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let contract = ContractDescriptor::interface::<dyn Service>();

    let services = ExportedTypes::crate_of(&contract)
        .ok_or_else(|| CoreError::configuration("no services exported"))?;

    let mut container = IocContainer::new();
    container.add_all_singleton_indexed::<dyn Service, _, _>(&contract, &services, |s| s.name())?;
    container.build()?;

    for service in container.resolve_all::<dyn Service>()? {
        println!("registered: {}", service.name());
    }

    let index: Arc<ServiceIndex<&'static str, dyn Service>> = container.resolve()?;
    if let Some(images) = index.get("images") {
        println!("by key: {}", images.name());
    }

    Ok(())
}
