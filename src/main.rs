use anyhow::Context;
use event_registry::{init_logging, Blueprint, EventHub, Evented, HubConfig, Object, Registry};
use std::path::PathBuf;

struct Person {
    name: String,
}

impl Person {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    fn greet(&self) {
        tracing::info!("Hi, my name is {}", self.name);
    }

    fn reply(&self) {
        tracing::info!("Nice to meet you! I'm {}", self.name);
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    tracing::info!(
        version = event_registry::VERSION,
        built = event_registry::BUILD_DATE,
        "event-registry demo"
    );

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => HubConfig::load_from_file(&path)
            .with_context(|| format!("loading hub config from {}", path.display()))?,
        None => HubConfig::default(),
    };

    let registry = Registry::new(EventHub::with_config(config));

    // Every person shares the registry's hub
    let people = Blueprint::<Person>::new();
    registry.register(&people);

    let me = people.construct(Person::new("Steven"));
    let you = people.construct(Person::new("David"));

    you.on("greet", |this, _| {
        let person = this
            .downcast::<Object<Person>>()
            .context("greet listener scope is not a person")?;
        person.greet();
        person.emit("reply", &[])?;
        Ok(())
    })?;

    me.on("reply", |this, _| {
        let person = this
            .downcast::<Object<Person>>()
            .context("reply listener scope is not a person")?;
        person.reply();
        Ok(())
    })?;

    let delivered = you.emit("greet", &[])?;
    tracing::debug!(delivered, subscribers = registry.subscriber_count(), "Demo finished");

    Ok(())
}
