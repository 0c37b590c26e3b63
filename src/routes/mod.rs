use std::fmt;

/// Screens the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Signup,
    Premiums,
    Purchase,
    Policies,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Signup => "/signup",
            Route::Premiums => "/premiums",
            Route::Purchase => "/purchase",
            Route::Policies => "/policies",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
