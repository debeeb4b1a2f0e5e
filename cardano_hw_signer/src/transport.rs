use crate::protocol::{Request, Response};
use crate::Result;

/// A session with the device: sends one request and blocks until its reply.
///
/// A device failure must be returned as [`crate::Error::DeviceError`], the signer never
/// sees a failure as a [`Response`].
pub trait Transport {
    fn call(&mut self, request: &Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn call(&mut self, request: &Request) -> Result<Response> {
        (**self).call(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(&mut self, request: &Request) -> Result<Response> {
        (**self).call(request)
    }
}
