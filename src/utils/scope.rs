use crate::gpu::{
    Buffer, BufferInfo, CommandDrain, ComputeTaskInfo, Context, GraphicsTaskInfo, Image,
    ImageInfo, RenderPass, RenderPassInfo, ResourcePool, Result, Task, Timestamp, Transaction,
    TransactionInfo,
};
use crate::utils::Handle;
use std::ops::{Deref, DerefMut};

enum ScopedHandle {
    Buffer(Handle<Buffer>),
    Image(Handle<Image>),
    Task(Handle<Task>),
    RenderPass(Handle<RenderPass>),
    ResourcePool(Handle<ResourcePool>),
    Transaction(Handle<Transaction>),
    Drain(Handle<CommandDrain>),
    Timestamp(Handle<Timestamp>),
}

/// Registers every resource created through it and destroys them all, newest
/// first, when the scope ends. Dereferences to the context for everything
/// else, so nested scopes and non-owning calls pass straight through.
pub struct Scope<'a> {
    ctx: &'a mut Context,
    owned: Vec<ScopedHandle>,
}

impl<'a> Scope<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Self {
            ctx,
            owned: Vec::new(),
        }
    }

    pub fn make_buffer(&mut self, info: &BufferInfo) -> Result<Handle<Buffer>> {
        let handle = self.ctx.make_buffer(info)?;
        self.owned.push(ScopedHandle::Buffer(handle));
        Ok(handle)
    }

    pub fn make_image(&mut self, info: &ImageInfo) -> Result<Handle<Image>> {
        let handle = self.ctx.make_image(info)?;
        self.owned.push(ScopedHandle::Image(handle));
        Ok(handle)
    }

    pub fn make_compute_task(&mut self, info: &ComputeTaskInfo) -> Result<Handle<Task>> {
        let handle = self.ctx.make_compute_task(info)?;
        self.owned.push(ScopedHandle::Task(handle));
        Ok(handle)
    }

    pub fn make_graphics_task(&mut self, info: &GraphicsTaskInfo) -> Result<Handle<Task>> {
        let handle = self.ctx.make_graphics_task(info)?;
        self.owned.push(ScopedHandle::Task(handle));
        Ok(handle)
    }

    pub fn make_render_pass(&mut self, info: &RenderPassInfo) -> Result<Handle<RenderPass>> {
        let handle = self.ctx.make_render_pass(info)?;
        self.owned.push(ScopedHandle::RenderPass(handle));
        Ok(handle)
    }

    pub fn make_resource_pool(&mut self, task: Handle<Task>) -> Result<Handle<ResourcePool>> {
        let handle = self.ctx.make_resource_pool(task)?;
        self.owned.push(ScopedHandle::ResourcePool(handle));
        Ok(handle)
    }

    pub fn make_transaction(&mut self, info: &TransactionInfo) -> Result<Handle<Transaction>> {
        let handle = self.ctx.make_transaction(info)?;
        self.owned.push(ScopedHandle::Transaction(handle));
        Ok(handle)
    }

    pub fn make_command_drain(&mut self) -> Result<Handle<CommandDrain>> {
        let handle = self.ctx.make_command_drain()?;
        self.owned.push(ScopedHandle::Drain(handle));
        Ok(handle)
    }

    pub fn make_timestamp(&mut self) -> Result<Handle<Timestamp>> {
        let handle = self.ctx.make_timestamp()?;
        self.owned.push(ScopedHandle::Timestamp(handle));
        Ok(handle)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        while let Some(handle) = self.owned.pop() {
            match handle {
                ScopedHandle::Buffer(h) => self.ctx.destroy_buffer(h),
                ScopedHandle::Image(h) => self.ctx.destroy_image(h),
                ScopedHandle::Task(h) => self.ctx.destroy_task(h),
                ScopedHandle::RenderPass(h) => self.ctx.destroy_render_pass(h),
                ScopedHandle::ResourcePool(h) => self.ctx.destroy_resource_pool(h),
                ScopedHandle::Transaction(h) => self.ctx.destroy_transaction(h),
                ScopedHandle::Drain(h) => self.ctx.destroy_command_drain(h),
                ScopedHandle::Timestamp(h) => self.ctx.destroy_timestamp(h),
            }
        }
    }
}

impl Deref for Scope<'_> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}
