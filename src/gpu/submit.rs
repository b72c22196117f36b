use super::translate::{Recording, SubmitDetail};
use super::{Command, Context, GPUError, Result, SubmitSummary, TransactionInfo};
use crate::utils::Handle;
use ash::vk;
use ash::vk::Handle as _;

/// How long one fence poll waits before spinning again.
const SPIN_INTERVAL_NS: u64 = 3_000_000;

/// A prerecorded secondary command-buffer set. Immutable after creation; may
/// be inline-scheduled any number of times while it and the resources it
/// references stay alive.
pub struct Transaction {
    pub(crate) details: Vec<SubmitDetail>,
    pub(crate) debug_name: String,
}

impl Transaction {
    pub(crate) fn destroy(mut self, device: &ash::Device) {
        for detail in self.details.drain(..) {
            unsafe {
                device.destroy_semaphore(detail.signal_sema, None);
                device.destroy_command_pool(detail.cmd_pool, None);
            }
        }
        log::debug!("destroyed transaction '{}'", self.debug_name);
    }
}

/// A one-shot primary submission scope. Owns the submit details of the last
/// submission and the fence that observes its completion.
pub struct CommandDrain {
    pub(crate) details: Vec<SubmitDetail>,
    pub(crate) fence: vk::Fence,
}

impl CommandDrain {
    pub(crate) fn destroy(mut self, device: &ash::Device) {
        for detail in self.details.drain(..) {
            unsafe {
                device.destroy_semaphore(detail.signal_sema, None);
                device.destroy_command_pool(detail.cmd_pool, None);
            }
        }
        unsafe { device.destroy_fence(self.fence, None) };
        log::debug!("destroyed command drain");
    }
}

fn summarize(details: &[SubmitDetail]) -> Vec<SubmitSummary> {
    details
        .iter()
        .map(|d| SubmitSummary {
            submit_type: d.submit_type,
            wait_sema: d.wait_sema.map(|s| s.as_raw()),
            signal_sema: d.signal_sema.as_raw(),
        })
        .collect()
}

impl Context {
    pub fn make_command_drain(&mut self) -> Result<Handle<CommandDrain>> {
        let fence = unsafe {
            self.device
                .create_fence(&vk::FenceCreateInfo::builder().build(), None)
        }?;
        log::debug!("created command drain");
        self.drains
            .insert(CommandDrain {
                details: Vec::new(),
                fence,
            })
            .ok_or(GPUError::SlotError())
    }

    /// Translates `cmds` at primary level and submits the resulting command
    /// buffers. All but the last are submitted as class boundaries are
    /// crossed during recording; the trailing one signals the drain's fence.
    /// The drain keeps ownership of every pool and semaphore until waited.
    pub fn submit_commands(
        &mut self,
        drain: Handle<CommandDrain>,
        cmds: &[Command],
    ) -> Result<()> {
        assert!(!cmds.is_empty(), "cannot submit an empty command sequence");
        let fence = self
            .drains
            .get_ref(drain)
            .ok_or(GPUError::InvalidHandle("command drain"))?
            .fence;

        let mut rec = Recording::new(vk::CommandBufferLevel::PRIMARY);
        if let Err(err) = self.record_commands(&mut rec, cmds) {
            // Details flushed before the failure are already executing; let
            // them finish before their pools are recycled.
            unsafe {
                let _ = self.device.device_wait_idle();
            }
            self.release_submit_details(&mut rec.details);
            return Err(err);
        }

        // Hand ownership to the drain before the tail submit so a failure
        // cannot strand live pools and semaphores.
        let drain_data = self.drains.get_mut_ref(drain).unwrap();
        let mut stale = std::mem::replace(&mut drain_data.details, rec.details);
        // Details from an earlier, already-waited submission are recycled now.
        self.release_submit_details(&mut stale);

        let drain_data = self.drains.get_ref(drain).unwrap();
        if let Some(last) = drain_data.details.last() {
            unsafe { self.device.end_command_buffer(last.cmd_buf) }?;
            self.submit_one(last, fence)?;
        }
        log::debug!("submitted {} command(s) for execution", cmds.len());
        Ok(())
    }

    /// Blocks until the drain's fence signals, then recycles the submission's
    /// pools and semaphores and resets the fence. Polls forever on a fixed
    /// spin interval; device loss surfaces as an error.
    pub fn wait_drain(&mut self, drain: Handle<CommandDrain>) -> Result<()> {
        let drain_data = self
            .drains
            .get_ref(drain)
            .ok_or(GPUError::InvalidHandle("command drain"))?;
        if drain_data.details.is_empty() {
            // Nothing was submitted (e.g. every copy was zero-sized), so the
            // fence was never queued and would never signal.
            log::warn!("waited on a command drain with no submission");
            return Ok(());
        }
        let fence = drain_data.fence;
        loop {
            match unsafe {
                self.device
                    .wait_for_fences(&[fence], true, SPIN_INTERVAL_NS)
            } {
                Ok(()) => break,
                Err(vk::Result::TIMEOUT) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let drain_data = self.drains.get_mut_ref(drain).unwrap();
        let mut details = std::mem::take(&mut drain_data.details);
        self.release_submit_details(&mut details);
        unsafe { self.device.reset_fences(&[fence]) }?;
        log::debug!("command drain returned");
        Ok(())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_command_drain(&mut self, handle: Handle<CommandDrain>) {
        match self.drains.take(handle) {
            Some(drain) => drain.destroy(&self.device),
            None => log::warn!("ignored destroy of dead command drain handle"),
        }
    }

    /// Prerecords `commands` into secondary command buffers grouped by submit
    /// class. The transaction is immutable once created.
    pub fn make_transaction(&mut self, info: &TransactionInfo) -> Result<Handle<Transaction>> {
        let mut rec = Recording::new(vk::CommandBufferLevel::SECONDARY);
        if let Err(err) = self.record_commands(&mut rec, info.commands) {
            self.release_submit_details(&mut rec.details);
            return Err(err);
        }
        if let Some(last) = rec.details.last() {
            unsafe { self.device.end_command_buffer(last.cmd_buf) }?;
        }
        log::debug!("created transaction '{}'", info.debug_name);
        self.transactions
            .insert(Transaction {
                details: rec.details,
                debug_name: info.debug_name.to_string(),
            })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_transaction(&mut self, handle: Handle<Transaction>) {
        match self.transactions.take(handle) {
            Some(transaction) => transaction.destroy(&self.device),
            None => log::warn!("ignored destroy of dead transaction handle"),
        }
    }

    /// Summaries of the drain's last submission, in submit order.
    pub fn drain_submits(&self, handle: Handle<CommandDrain>) -> Result<Vec<SubmitSummary>> {
        self.drains
            .get_ref(handle)
            .map(|drain| summarize(&drain.details))
            .ok_or(GPUError::InvalidHandle("command drain"))
    }

    /// Summaries of a transaction's recorded details, in order.
    pub fn transaction_submits(&self, handle: Handle<Transaction>) -> Result<Vec<SubmitSummary>> {
        self.transactions
            .get_ref(handle)
            .map(|transaction| summarize(&transaction.details))
            .ok_or(GPUError::InvalidHandle("transaction"))
    }
}
