//! The process-wide type universe lives in its own test binary because it can
//! only be installed once per process

use arbitrater::{
    ConfigError, InstanceCreator, Reflect, TypeDescriptor, TypeUniverse, global_universe,
    install_universe,
};

trait Greeter {
    fn greeting(&self) -> String;
}

impl Reflect for Box<dyn Greeter> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::interface::<Self>()
    }
}

#[derive(Reflect)]
struct English {
    name: String,
}

impl Greeter for English {
    fn greeting(&self) -> String {
        format!("hello {}", self.name)
    }
}

fn english_as_greeter(english: English) -> Box<dyn Greeter> {
    Box::new(english)
}

#[test]
fn test_installed_universe_is_used_by_default() {
    install_universe(
        TypeUniverse::builder()
            .implementor::<Box<dyn Greeter>, English>(english_as_greeter)
            .build(),
    )
    .unwrap();

    assert_eq!(
        install_universe(TypeUniverse::empty()),
        Err(ConfigError::UniverseAlreadyInstalled)
    );
    assert_eq!(global_universe().len(), 1);

    let greeter = InstanceCreator::<Box<dyn Greeter>>::new()
        .create_instance()
        .ok()
        .unwrap();
    assert!(greeter.greeting().starts_with("hello "));
}
